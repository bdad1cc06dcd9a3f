//! Tipos de erro para o cliente HTTP da fila de leads.
//!
//! Define [`ApiError`] com variantes para falhas de transporte, rejeições
//! do servidor e respostas que não puderam ser decodificadas. Usa `thiserror`
//! para derivar `Display` e `Error` a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao falar com o servidor da fila.
///
/// - [`Transport`](ApiError::Transport): a requisição não chegou ao servidor
/// - [`Rejected`](ApiError::Rejected): o servidor respondeu com status não-2xx
/// - [`Decode`](ApiError::Decode): a resposta chegou mas o corpo é inválido
#[derive(Debug, Error)]
pub enum ApiError {
    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("could not reach the queue server: {0}")]
    Transport(#[from] reqwest::Error),

    /// Resposta não-2xx. A mensagem vem do corpo, repassada ao operador sem alteração.
    #[error("server rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Corpo da resposta não corresponde ao formato esperado.
    #[error("unexpected response from the queue server: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display() {
        let err = ApiError::Rejected {
            status: 422,
            message: "new_status is invalid".into(),
        };
        assert_eq!(
            err.to_string(),
            "server rejected the request (status 422): new_status is invalid"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
