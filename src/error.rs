// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Errors
//
// Wrong-state node actions and unknown node ids are not errors; they are
// silent no-ops in the engine. Only structurally malformed input and
// execution-context failures surface here.

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structural problems in an `init` payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("duplicate node id `{0}`")]
    DuplicateNodeId(String),
    #[error("link {link} references unknown node `{id}`")]
    UnknownEndpoint { link: usize, id: String },
}

/// A message that could not cross the execution-context boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failures of the isolated execution context, seen from the controller.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker terminated")]
    Disconnected,
    #[error("worker restart budget exhausted after {attempts} attempts")]
    RestartsExhausted { attempts: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::UnknownEndpoint { link: 3, id: "x".into() };
        assert_eq!(err.to_string(), "link 3 references unknown node `x`");
        assert_eq!(
            ConfigError::DuplicateNodeId("7".into()).to_string(),
            "duplicate node id `7`"
        );
    }

    #[test]
    fn test_protocol_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ProtocolError = json_err.into();
        assert!(err.to_string().starts_with("malformed message"));
    }
}
