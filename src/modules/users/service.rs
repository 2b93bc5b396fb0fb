use tracing::{instrument, warn};

use classconnect_db::{Store, StoreError};
use classconnect_models::users::CurrentUserResponse;

pub struct UserService;

impl UserService {
    /// The caller's account plus role profile. `None` if the account is gone.
    #[instrument(skip(db))]
    pub async fn current_user(
        db: &dyn Store,
        user_id: i64,
    ) -> Result<Option<CurrentUserResponse>, StoreError> {
        let Some(user) = db.find_user_by_id(user_id).await? else {
            return Ok(None);
        };

        let profile = match db.find_profile(&user).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id, error = %e, "Failed to load role profile");
                None
            }
        };

        Ok(Some(CurrentUserResponse::new(user, profile)))
    }
}
