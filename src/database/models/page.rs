use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tenancy::reference::deserialize_optional_reference;
use crate::tenancy::WebsiteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonLink {
    pub text: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    /// Media id
    pub image: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Layout building blocks, tagged by `block_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "block_type", rename_all = "camelCase")]
pub enum Block {
    Hero {
        heading: String,
        #[serde(default)]
        subheading: Option<String>,
        #[serde(default)]
        image: Option<String>,
        #[serde(default)]
        cta_text: Option<String>,
        #[serde(default)]
        cta_link: Option<String>,
    },
    Content {
        /// Rich text document, opaque here
        content: Value,
        #[serde(default = "default_width")]
        width: String,
    },
    ImageGallery {
        images: Vec<GalleryImage>,
        #[serde(default = "default_columns")]
        columns: u8,
    },
    CallToAction {
        heading: String,
        #[serde(default)]
        description: Option<String>,
        primary_button: ButtonLink,
        #[serde(default)]
        secondary_button: Option<ButtonLink>,
        #[serde(default = "default_background")]
        background_color: String,
    },
}

fn default_width() -> String {
    "normal".to_string()
}

fn default_columns() -> u8 {
    3
}

fn default_background() -> String {
    "default".to_string()
}

impl Block {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Block::ImageGallery { images, columns } => {
                if images.is_empty() {
                    return Err("image gallery requires at least one image".to_string());
                }
                if !(1..=6).contains(columns) {
                    return Err(format!("image gallery columns must be between 1 and 6, got {}", columns));
                }
                Ok(())
            }
            Block::Content { width, .. } => match width.as_str() {
                "narrow" | "normal" | "wide" | "full" => Ok(()),
                other => Err(format!("unknown content width: {}", other)),
            },
            Block::CallToAction { primary_button, background_color, .. } => {
                if primary_button.text.is_none() || primary_button.link.is_none() {
                    return Err("call to action requires primary button text and link".to_string());
                }
                match background_color.as_str() {
                    "default" | "primary" | "secondary" | "dark" => Ok(()),
                    other => Err(format!("unknown background color: {}", other)),
                }
            }
            Block::Hero { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default, deserialize_with = "deserialize_optional_reference")]
    pub website: Option<WebsiteId>,
    #[serde(default)]
    pub layout: Vec<Block>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
