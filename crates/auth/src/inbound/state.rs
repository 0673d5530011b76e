use std::sync::Arc;

use app_core::config::Config;
use app_core::jwt::TokenManager;
use tower_cookies::Key;

use crate::usecase::profile::ProfileUseCase;
use crate::usecase::signin::SigninUseCase;

#[derive(Clone)]
pub struct AuthState {
    pub cookie_key: Key,
    pub config: Arc<Config>,
    pub token: Arc<dyn TokenManager>,
    pub signin: Arc<dyn SigninUseCase>,
    pub profile: Arc<dyn ProfileUseCase>,
}

impl AuthState {
    pub fn new(
        cookie_key: Key,
        config: Arc<Config>,
        token: Arc<dyn TokenManager>,
        signin: Arc<dyn SigninUseCase>,
        profile: Arc<dyn ProfileUseCase>,
    ) -> Self {
        Self { cookie_key, config, token, signin, profile }
    }
}

#[cfg(test)]
mod tests {
    use app_core::jwt::MockTokenManager;

    use super::*;
    use crate::usecase::profile::MockProfileUseCase;
    use crate::usecase::signin::MockSigninUseCase;

    #[test]
    fn test_auth_state_new() {
        let cookie_key = Key::generate();
        let token: Arc<dyn TokenManager> = Arc::new(MockTokenManager::new());
        let signin: Arc<dyn SigninUseCase> = Arc::new(MockSigninUseCase::new());
        let profile: Arc<dyn ProfileUseCase> = Arc::new(MockProfileUseCase::new());

        let config = Arc::new(Config::builder_test().build());

        let state = AuthState::new(cookie_key.clone(), config, token.clone(), signin.clone(), profile.clone());

        assert!(Arc::ptr_eq(&state.token, &token));
        assert!(Arc::ptr_eq(&state.signin, &signin));
        assert!(Arc::ptr_eq(&state.profile, &profile));
        assert_eq!(state.cookie_key.master(), cookie_key.master());
    }
}
