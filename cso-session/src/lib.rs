//! The activated session: frame parsing/building (`Parser`, grounded on
//! `csoparser/parser_implement.go`) and the reconnect/dispatch state machine
//! (`Session`, grounded on `csoconnector/connector_implement.go`) that ties
//! the handshake, framed link, counter and retry queue together.

mod connector;
mod error;
mod parser;

pub use connector::{MessageCallback, Session};
pub use error::SessionError;
pub use parser::Parser;

#[cfg(test)]
mod tests {
    use super::*;
    use cso_handshake::Config;
    use std::sync::Arc;

    fn test_config() -> Config {
        Config::new("proj", "dG9rZW4=", "conn", "", "http://127.0.0.1:1")
    }

    #[test]
    fn sends_fail_before_activation() {
        let session = Arc::new(Session::new(8, test_config()));
        assert!(matches!(
            session.send_message("peer", b"hi", true, false),
            Err(SessionError::NotActivated)
        ));
        assert!(matches!(
            session.send_message_and_retry("peer", b"hi", true, 3),
            Err(SessionError::NotActivated)
        ));
    }

    #[test]
    fn is_activated_starts_false() {
        let session = Session::new(8, test_config());
        assert!(!session.is_activated());
    }
}
