use thiserror::Error;

/// Taxonomía de errores del núcleo de sesión y mutaciones.
///
/// Los errores terminales de autenticación (`InvalidToken`, `RefreshFailed`)
/// limpian la sesión; los fallos de mutación quedan acotados a la colección
/// afectada y nunca tocan la sesión.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Login rechazado por el servidor; el usuario puede reintentar
    #[error("credenciales inválidas")]
    InvalidCredentials,

    /// Validación o renovación rechazada; terminal para la sesión
    #[error("token inválido o expirado")]
    InvalidToken,

    /// Fallo de transporte; se informa al caller, sin reintentos automáticos
    #[error("error de red: {0}")]
    NetworkError(String),

    /// La renovación falló por cualquier causa; siempre termina la sesión
    #[error("renovación de sesión fallida: {0}")]
    RefreshFailed(String),

    /// La confirmación remota de una mutación optimista falló; se revierte
    #[error("mutación rechazada: {0}")]
    MutationFailed(String),
}
