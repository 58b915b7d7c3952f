mod aggregation;
mod drafts;
mod fanout;
mod identity;
mod membership;

use tracing::info;
use uuid::Uuid;

use crate::error::TagbookError;
use crate::models::User;
use crate::notify::Notifier;
use crate::ocr::ReceiptExtractor;
use crate::storage::Storage;

/// Verified caller identity, established by the HTTP layer before the
/// service is invoked.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub uid: String,
    /// Phone number the caller proved ownership of, if any.
    pub phone_number: Option<String>,
}

/// Stateless reaction surface over the three external collaborators. One
/// instance serves every trigger invocation; all state lives in storage.
pub struct TagbookService<S: Storage, N: Notifier, X: ReceiptExtractor> {
    storage: S,
    notifier: N,
    extractor: X,
}

impl<S: Storage, N: Notifier, X: ReceiptExtractor> TagbookService<S, N, X> {
    pub fn new(storage: S, notifier: N, extractor: X) -> Self {
        info!("Initializing TagbookService");
        TagbookService { storage, notifier, extractor }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn extractor(&self) -> &X {
        &self.extractor
    }

    /// Callable surface: resolve-or-create user by phone.
    ///
    /// The caller may only resolve the phone number they authenticated
    /// with; on first contact a canonical user record is created and linked
    /// to the caller's uid.
    pub async fn get_user_by_phone(
        &self,
        auth: &AuthContext,
        phone_number: &str,
    ) -> Result<User, TagbookError> {
        if phone_number.is_empty() {
            return Err(TagbookError::InvalidArgument(
                "Phone number is required".to_string(),
            ));
        }
        if auth.phone_number.as_deref() != Some(phone_number) {
            return Err(TagbookError::PermissionDenied(
                "You can only access your own user data".to_string(),
            ));
        }

        if let Some(mut user) = self.storage.find_user_by_phone(phone_number).await? {
            user.uid = Some(auth.uid.clone());
            self.storage.update_user(user.clone()).await?;
            return Ok(user);
        }

        info!(phone = phone_number, "creating new user");
        let mut user = User::new(Uuid::new_v4().to_string(), phone_number.to_string());
        user.uid = Some(auth.uid.clone());
        self.storage.create_user(user).await
    }
}
