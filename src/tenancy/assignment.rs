use super::actor::ActingUser;
use super::reference::WebsiteId;
use crate::types::Operation;

/// Compute the stored `website` owner of tenant-scoped content.
///
/// `supplied` is the value in the incoming write and `original` the value
/// currently stored (updates only). Non-super-admins cannot choose or change
/// the owner: creates take the caller's default website and updates keep the
/// stored value. The supplied value is only used when nothing better exists.
pub fn resolve_website(
    user: Option<&ActingUser>,
    operation: Operation,
    supplied: Option<WebsiteId>,
    original: Option<&WebsiteId>,
) -> Option<WebsiteId> {
    let Some(user) = user else {
        return supplied;
    };

    match operation {
        Operation::Create => {
            if user.is_super_admin() && supplied.is_some() {
                return supplied;
            }
            user.default_website.clone().or(supplied)
        }
        Operation::Update => {
            if user.is_super_admin() && supplied.is_some() {
                return supplied;
            }
            original.cloned().or(supplied)
        }
        Operation::Read | Operation::Delete => supplied,
    }
}
