// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP (Stateless)
// ============================================================================
// NO tiene lógica de negocio: expone el contrato remoto del backend.
// El núcleo depende del trait; el adaptador gloo-net existe solo en wasm.
// ============================================================================

use async_trait::async_trait;

use crate::models::auth::{LoginRequest, LoginResponse, RefreshResponse, ValidateResponse};
use crate::models::website::{CreateWebsiteRequest, Website, WebsiteStatus};
use crate::models::SessionError;

/// Contrato remoto consumido por el núcleo
#[async_trait(?Send)]
pub trait DashboardApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, SessionError>;
    async fn validate(&self, access_token: &str) -> Result<ValidateResponse, SessionError>;
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SessionError>;
    async fn fetch_websites(&self, access_token: &str) -> Result<Vec<Website>, SessionError>;
    async fn create_website(
        &self,
        access_token: &str,
        request: &CreateWebsiteRequest,
    ) -> Result<Website, SessionError>;
    async fn delete_website(&self, access_token: &str, id: &str) -> Result<(), SessionError>;
    async fn update_website_status(
        &self,
        access_token: &str,
        id: &str,
        status: WebsiteStatus,
    ) -> Result<(), SessionError>;
}

/// Cliente HTTP del navegador (gloo-net)
#[cfg(target_arch = "wasm32")]
pub struct HttpApiClient {
    base_url: String,
}

#[cfg(target_arch = "wasm32")]
impl HttpApiClient {
    pub fn new() -> Self {
        Self {
            base_url: crate::config::CONFIG.backend_url().to_string(),
        }
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for HttpApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl DashboardApi for HttpApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, SessionError> {
        let url = format!("{}/auth/login", self.base_url);
        log::info!("🔐 Login para: {}", request.email);

        let response = gloo_net::http::Request::post(&url)
            .json(request)
            .map_err(|e| SessionError::NetworkError(format!("Request build error: {}", e)))?
            .send()
            .await
            .map_err(|e| SessionError::NetworkError(format!("Network error: {}", e)))?;

        match response.status() {
            200..=299 => response
                .json::<LoginResponse>()
                .await
                .map_err(|e| SessionError::NetworkError(format!("Parse error: {}", e))),
            401 | 403 => Err(SessionError::InvalidCredentials),
            status => Err(SessionError::NetworkError(format!("HTTP {}", status))),
        }
    }

    async fn validate(&self, access_token: &str) -> Result<ValidateResponse, SessionError> {
        let url = format!("{}/auth/validate", self.base_url);

        let response = gloo_net::http::Request::get(&url)
            .header("Authorization", &Self::bearer(access_token))
            .send()
            .await
            .map_err(|e| SessionError::NetworkError(format!("Network error: {}", e)))?;

        match response.status() {
            200..=299 => response
                .json::<ValidateResponse>()
                .await
                .map_err(|e| SessionError::NetworkError(format!("Parse error: {}", e))),
            401 => Err(SessionError::InvalidToken),
            status => Err(SessionError::NetworkError(format!("HTTP {}", status))),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SessionError> {
        let url = format!("{}/auth/refresh", self.base_url);
        log::info!("🔄 Renovando tokens contra el backend");

        let response = gloo_net::http::Request::post(&url)
            .header("Authorization", &Self::bearer(refresh_token))
            .send()
            .await
            .map_err(|e| SessionError::NetworkError(format!("Network error: {}", e)))?;

        match response.status() {
            200..=299 => response
                .json::<RefreshResponse>()
                .await
                .map_err(|e| SessionError::NetworkError(format!("Parse error: {}", e))),
            401 => Err(SessionError::InvalidToken),
            status => Err(SessionError::NetworkError(format!("HTTP {}", status))),
        }
    }

    async fn fetch_websites(&self, access_token: &str) -> Result<Vec<Website>, SessionError> {
        let url = format!("{}/websites", self.base_url);

        let response = gloo_net::http::Request::get(&url)
            .header("Authorization", &Self::bearer(access_token))
            .send()
            .await
            .map_err(|e| SessionError::NetworkError(format!("Network error: {}", e)))?;

        match response.status() {
            200..=299 => response
                .json::<Vec<Website>>()
                .await
                .map_err(|e| SessionError::NetworkError(format!("Parse error: {}", e))),
            401 => Err(SessionError::InvalidToken),
            status => Err(SessionError::NetworkError(format!("HTTP {}", status))),
        }
    }

    async fn create_website(
        &self,
        access_token: &str,
        request: &CreateWebsiteRequest,
    ) -> Result<Website, SessionError> {
        let url = format!("{}/websites", self.base_url);
        log::info!("🌐 Creando sitio: {}", request.domain);

        let response = gloo_net::http::Request::post(&url)
            .header("Authorization", &Self::bearer(access_token))
            .json(request)
            .map_err(|e| SessionError::NetworkError(format!("Request build error: {}", e)))?
            .send()
            .await
            .map_err(|e| SessionError::NetworkError(format!("Network error: {}", e)))?;

        match response.status() {
            200..=299 => response
                .json::<Website>()
                .await
                .map_err(|e| SessionError::NetworkError(format!("Parse error: {}", e))),
            401 => Err(SessionError::InvalidToken),
            status => Err(SessionError::NetworkError(format!("HTTP {}", status))),
        }
    }

    async fn delete_website(&self, access_token: &str, id: &str) -> Result<(), SessionError> {
        let url = format!("{}/websites/{}", self.base_url, id);
        log::info!("🗑️ Eliminando sitio: {}", id);

        let response = gloo_net::http::Request::delete(&url)
            .header("Authorization", &Self::bearer(access_token))
            .send()
            .await
            .map_err(|e| SessionError::NetworkError(format!("Network error: {}", e)))?;

        match response.status() {
            200..=299 => Ok(()),
            401 => Err(SessionError::InvalidToken),
            status => Err(SessionError::NetworkError(format!("HTTP {}", status))),
        }
    }

    async fn update_website_status(
        &self,
        access_token: &str,
        id: &str,
        status: WebsiteStatus,
    ) -> Result<(), SessionError> {
        let url = format!("{}/websites/{}/status", self.base_url, id);

        let response = gloo_net::http::Request::put(&url)
            .header("Authorization", &Self::bearer(access_token))
            .json(&UpdateStatusRequest { status })
            .map_err(|e| SessionError::NetworkError(format!("Request build error: {}", e)))?
            .send()
            .await
            .map_err(|e| SessionError::NetworkError(format!("Network error: {}", e)))?;

        match response.status() {
            200..=299 => Ok(()),
            401 => Err(SessionError::InvalidToken),
            status => Err(SessionError::NetworkError(format!("HTTP {}", status))),
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[derive(serde::Serialize)]
struct UpdateStatusRequest {
    status: WebsiteStatus,
}

/// API falsa para tests: resultados encolados + contadores de llamadas
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use futures::channel::oneshot;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    #[derive(Default)]
    pub struct FakeApi {
        pub login_results: RefCell<VecDeque<Result<LoginResponse, SessionError>>>,
        pub validate_results: RefCell<VecDeque<Result<ValidateResponse, SessionError>>>,
        pub refresh_results: RefCell<VecDeque<Result<RefreshResponse, SessionError>>>,
        pub websites_results: RefCell<VecDeque<Result<Vec<Website>, SessionError>>>,
        pub create_results: RefCell<VecDeque<Result<Website, SessionError>>>,
        pub delete_results: RefCell<VecDeque<Result<(), SessionError>>>,
        pub status_results: RefCell<VecDeque<Result<(), SessionError>>>,
        /// Compuertas para mantener una renovación "en vuelo" hasta soltarla
        pub refresh_gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
        pub refresh_calls: Cell<usize>,
        pub delete_calls: RefCell<Vec<String>>,
        pub last_refresh_token: RefCell<Option<String>>,
    }

    impl FakeApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_refresh(&self, result: Result<RefreshResponse, SessionError>) {
            self.refresh_results.borrow_mut().push_back(result);
        }

        /// La próxima renovación quedará pendiente hasta que se dispare `tx`
        pub fn gate_next_refresh(&self) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.refresh_gates.borrow_mut().push_back(rx);
            tx
        }
    }

    #[async_trait(?Send)]
    impl DashboardApi for FakeApi {
        async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, SessionError> {
            self.login_results
                .borrow_mut()
                .pop_front()
                .expect("FakeApi: login sin resultado encolado")
        }

        async fn validate(&self, _access_token: &str) -> Result<ValidateResponse, SessionError> {
            self.validate_results
                .borrow_mut()
                .pop_front()
                .expect("FakeApi: validate sin resultado encolado")
        }

        async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SessionError> {
            self.refresh_calls.set(self.refresh_calls.get() + 1);
            *self.last_refresh_token.borrow_mut() = Some(refresh_token.to_string());

            let gate = self.refresh_gates.borrow_mut().pop_front();
            if let Some(gate) = gate {
                let _ = gate.await;
            }

            self.refresh_results
                .borrow_mut()
                .pop_front()
                .expect("FakeApi: refresh sin resultado encolado")
        }

        async fn fetch_websites(&self, _access_token: &str) -> Result<Vec<Website>, SessionError> {
            self.websites_results
                .borrow_mut()
                .pop_front()
                .expect("FakeApi: fetch_websites sin resultado encolado")
        }

        async fn create_website(
            &self,
            _access_token: &str,
            _request: &CreateWebsiteRequest,
        ) -> Result<Website, SessionError> {
            self.create_results
                .borrow_mut()
                .pop_front()
                .expect("FakeApi: create_website sin resultado encolado")
        }

        async fn delete_website(&self, _access_token: &str, id: &str) -> Result<(), SessionError> {
            self.delete_calls.borrow_mut().push(id.to_string());
            self.delete_results
                .borrow_mut()
                .pop_front()
                .expect("FakeApi: delete_website sin resultado encolado")
        }

        async fn update_website_status(
            &self,
            _access_token: &str,
            _id: &str,
            _status: WebsiteStatus,
        ) -> Result<(), SessionError> {
            self.status_results
                .borrow_mut()
                .pop_front()
                .expect("FakeApi: update_website_status sin resultado encolado")
        }
    }
}
