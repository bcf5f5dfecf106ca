//! SBD session state machine (`AT+SBDIX`)
//!
//! # Round
//! A round sends `AT+SBDIX` up to `attempts` times:
//! ```text
//! send AT+SBDIX ──> +SBDIX: line? ──no──> next attempt
//!                        │yes
//!                   parse, expect OK
//!                        │
//!            MO status <= 4 ──> clear MO buffer (best effort), success
//!            MT status == 1 && MT length > 0 ──> retrieve message
//!            MT queued > 0 ──> drain round
//!                        │
//!                 success? ──no──> next attempt
//!                        │yes
//!                   round ends
//! ```
//! # Draining
//! Any parsed attempt that reports queued MT messages starts a drain round
//! on top of the current one. The drain round runs with a fresh attempt
//! budget; when it ends, the round below carries on with its remaining
//! attempts unless its MO transfer already succeeded. All drain rounds of
//! one call share the `max_drain_sessions` budget.

use crate::config::SessionConfig;
use crate::modem::SbdModem;
use crate::observer::ModemEvent;
use crate::sbdix::{parse_sbdix, SbdixReply, SBDIX_MARKER};
use bytes::Bytes;
use sbd_core::constants::OK;
use sbd_core::{SbdError, SbdResult};
use sbd_transport::StreamAccessor;

pub const CMD_SESSION: &str = "AT+SBDIX";

/// Result of `SbdModem::attempt_session`
///
/// Messages retrieved before a failure are kept.
#[derive(Debug)]
pub struct SessionOutcome {
    /// Non-empty MT messages in the order they were retrieved
    pub messages: Vec<Bytes>,
    /// Verdict of the whole session sequence
    pub result: SbdResult<()>,
    /// Drain rounds started during the call
    pub drain_rounds: u32,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The retrieved messages, or the error that ended the session
    pub fn into_result(self) -> SbdResult<Vec<Bytes>> {
        self.result.map(|()| self.messages)
    }
}

/// One pending round on the session stack
#[derive(Debug, Clone, Copy)]
struct Round {
    remaining: u32,
    drain: bool,
}

impl<T: StreamAccessor> SbdModem<T> {
    /// Run an SBD session: transmit the MO buffer and collect MT messages
    ///
    /// # Errors
    /// The outcome carries
    /// - `SbdError::RetryExhausted` if no attempt of the first round succeeded
    /// - the retrieval error if reading an MT message failed
    /// - transport, mismatch and parse errors as they occur
    ///
    /// A drain round that runs out of attempts is abandoned without failing
    /// the outcome.
    pub async fn attempt_session(&mut self) -> SessionOutcome {
        let config = self.config.session.clone();
        let mut messages = Vec::new();
        let mut drain_rounds = 0;
        let mut rounds = vec![self.start_round(&config, false)];

        while let Some(round) = rounds.last_mut() {
            if round.remaining == 0 {
                let reason = format!(
                    "Unable to establish session after {} attempts",
                    config.attempts
                );
                if round.drain {
                    rounds.pop();
                    self.channel.emit(ModemEvent::DrainAbandoned(reason));
                    continue;
                }
                return SessionOutcome {
                    messages,
                    result: Err(SbdError::RetryExhausted(reason)),
                    drain_rounds,
                };
            }
            round.remaining -= 1;

            let status = match self.session_attempt(&mut messages).await {
                Ok(Some(status)) => status,
                Ok(None) => continue,
                Err(e) => {
                    return SessionOutcome {
                        messages,
                        result: Err(e),
                        drain_rounds,
                    };
                }
            };

            if status.mo_succeeded() {
                rounds.pop();
            }

            if status.mt_queued > 0 {
                if drain_rounds >= config.max_drain_sessions {
                    self.channel.emit(ModemEvent::DrainLimitReached {
                        max_drain_sessions: config.max_drain_sessions,
                        mt_queued: status.mt_queued,
                    });
                } else {
                    drain_rounds += 1;
                    self.channel.emit(ModemEvent::DrainRound {
                        mt_queued: status.mt_queued,
                    });
                    rounds.push(self.start_round(&config, true));
                }
            }
        }

        SessionOutcome {
            messages,
            result: Ok(()),
            drain_rounds,
        }
    }

    fn start_round(&self, config: &SessionConfig, drain: bool) -> Round {
        self.channel.emit(ModemEvent::SessionAttempt {
            attempts: config.attempts,
        });
        Round {
            remaining: config.attempts,
            drain,
        }
    }

    /// One `AT+SBDIX` exchange; `None` when the reply carried no status line
    async fn session_attempt(
        &mut self,
        messages: &mut Vec<Bytes>,
    ) -> SbdResult<Option<SbdixReply>> {
        self.channel.statistics_mut().increment_session_attempts();

        let reply = self.channel.send_and_read_reply(CMD_SESSION).await?;
        if !reply.contains(SBDIX_MARKER) {
            return Ok(None);
        }

        let status = parse_sbdix(&reply)?;
        self.channel.expect(OK).await?;
        self.channel.emit(ModemEvent::SessionReply(status));

        if status.mo_succeeded() {
            if let Err(e) = self.clear_mo_buffer().await {
                self.channel.emit(ModemEvent::MailboxClearFailed(e.to_string()));
            }
        }

        if status.has_mt_message() {
            let message = self.retrieve_mt_message().await?;
            if !message.is_empty() {
                messages.push(message);
            }
        }

        Ok(Some(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RetrievalMode, SessionConfig};
    use crate::observer::{MockModemObserver, ModemEvent};
    use crate::test_support::{fast_config, sbdrb_reply, scripted};
    use sbd_transport::IoTransport;
    use std::sync::Arc;
    use tokio_test::io::{Builder, Mock};

    const CLEAR_OK: &[u8] = b"AT+SBDD0\r\n0\r\n\r\nOK\r\n";

    fn sbdix(fields: &str) -> Vec<u8> {
        format!("AT+SBDIX\r\n+SBDIX: {}\r\n\r\nOK\r\n", fields).into_bytes()
    }

    fn with_session(mock: Mock, session: SessionConfig) -> SbdModem<IoTransport<Mock>> {
        SbdModem::with_config(IoTransport::new(mock), fast_config().with_session(session))
    }

    #[tokio::test]
    async fn test_session_without_mt_traffic() {
        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 1, 0, 0, 0, 0"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .build();
        let mut modem = scripted(mock);
        let outcome = modem.attempt_session().await;
        assert!(outcome.is_success());
        assert!(outcome.messages.is_empty());
        assert_eq!(outcome.drain_rounds, 0);
        assert_eq!(modem.statistics().session_attempts, 1);
    }

    #[tokio::test]
    async fn test_session_retrieves_and_drains_once() {
        let payload = b"0123456789";
        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 5, 1, 7, 10, 1"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .write(b"AT+SBDRB\r")
            .read(&sbdrb_reply(payload))
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 6, 0, 0, 0, 0"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .build();
        let mut modem = with_session(
            mock,
            SessionConfig::default().with_retrieval(RetrievalMode::Verified),
        );

        let outcome = modem.attempt_session().await;
        assert_eq!(outcome.drain_rounds, 1);
        assert_eq!(modem.statistics().session_attempts, 2);
        assert_eq!(modem.statistics().messages_retrieved, 1);
        let messages = outcome.into_result().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(&messages[0][..], payload);
    }

    #[tokio::test]
    async fn test_session_retrieves_and_drains_once_line_mode() {
        // Line mode never reads the length header; a real 0x0A header would
        // split the raw line, so this frame carries a zero header instead.
        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 5, 1, 7, 10, 1"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .write(b"AT+SBDRB\r")
            .read(b"AT+SBDRB\r\x00\x00abcdefghij\x03\xf7\r\nOK\r\n")
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 6, 0, 0, 0, 0"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .build();
        let mut modem = scripted(mock);
        assert_eq!(modem.config().session.retrieval, RetrievalMode::Line);

        let outcome = modem.attempt_session().await;
        assert_eq!(outcome.drain_rounds, 1);
        assert_eq!(modem.statistics().session_attempts, 2);
        let messages = outcome.into_result().unwrap();
        assert_eq!(messages, vec![Bytes::from_static(b"abcdefghij")]);
    }

    #[tokio::test]
    async fn test_session_failed_attempt_with_queued_mt_drains() {
        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(&sbdix("32, 1, 1, 7, 5, 1"))
            .write(b"AT+SBDRB\r")
            .read(&sbdrb_reply(b"first"))
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 2, 1, 8, 6, 0"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .write(b"AT+SBDRB\r")
            .read(&sbdrb_reply(b"second"))
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 3, 0, 0, 0, 0"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .build();
        let mut modem = scripted(mock);

        let outcome = modem.attempt_session().await;
        assert_eq!(outcome.drain_rounds, 1);
        assert_eq!(modem.statistics().session_attempts, 3);
        let messages = outcome.into_result().unwrap();
        assert_eq!(messages, vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")]);
    }

    #[tokio::test]
    async fn test_session_failed_attempt_respects_drain_limit() {
        let mut observer = MockModemObserver::new();
        observer.expect_on_write().return_const(());
        observer.expect_on_line().return_const(());
        observer
            .expect_on_event()
            .withf(|event: &ModemEvent| matches!(event, ModemEvent::DrainLimitReached { .. }))
            .times(1)
            .return_const(());
        observer
            .expect_on_event()
            .withf(|event: &ModemEvent| matches!(event, ModemEvent::DrainRound { .. }))
            .never();
        observer
            .expect_on_event()
            .withf(|event: &ModemEvent| {
                !matches!(
                    event,
                    ModemEvent::DrainLimitReached { .. } | ModemEvent::DrainRound { .. }
                )
            })
            .return_const(());

        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(&sbdix("32, 1, 0, 0, 0, 2"))
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 2, 0, 0, 0, 0"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .build();
        let mut modem = with_session(mock, SessionConfig::default().with_max_drain_sessions(0))
            .with_observer(Arc::new(observer));

        let outcome = modem.attempt_session().await;
        assert!(outcome.is_success());
        assert_eq!(outcome.drain_rounds, 0);
        assert_eq!(modem.statistics().session_attempts, 2);
    }

    #[tokio::test]
    async fn test_session_drain_rounds_collect_messages() {
        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 1, 1, 7, 5, 1"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .write(b"AT+SBDRB\r")
            .read(&sbdrb_reply(b"first"))
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 2, 1, 8, 6, 0"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .write(b"AT+SBDRB\r")
            .read(&sbdrb_reply(b"second"))
            .build();
        let mut modem = scripted(mock);
        let messages = modem.attempt_session().await.into_result().unwrap();
        assert_eq!(messages, vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")]);
    }

    #[tokio::test]
    async fn test_session_retries_until_mo_succeeds() {
        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(b"AT+SBDIX\r\nERROR\r\n")
            .write(b"AT+SBDIX\r")
            .read(&sbdix("32, 3, 2, 0, 0, 0"))
            .write(b"AT+SBDIX\r")
            .read(&sbdix("1, 3, 0, 0, 0, 0"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .build();
        let mut modem = scripted(mock);
        let outcome = modem.attempt_session().await;
        assert!(outcome.is_success());
        assert_eq!(modem.statistics().session_attempts, 3);
    }

    #[tokio::test]
    async fn test_session_exhausted_keeps_messages() {
        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(&sbdix("18, 4, 1, 9, 5, 0"))
            .write(b"AT+SBDRB\r")
            .read(&sbdrb_reply(b"hello"))
            .write(b"AT+SBDIX\r")
            .read(&sbdix("18, 4, 0, 0, 0, 0"))
            .build();
        let mut modem = with_session(mock, SessionConfig::default().with_attempts(2));
        let outcome = modem.attempt_session().await;
        assert!(matches!(outcome.result, Err(SbdError::RetryExhausted(_))));
        assert_eq!(outcome.messages, vec![Bytes::from_static(b"hello")]);
    }

    #[tokio::test]
    async fn test_session_mailbox_clear_failure_is_ignored() {
        let mut observer = MockModemObserver::new();
        observer.expect_on_write().return_const(());
        observer.expect_on_line().return_const(());
        observer
            .expect_on_event()
            .withf(|event: &ModemEvent| matches!(event, ModemEvent::MailboxClearFailed(_)))
            .times(1)
            .return_const(());
        observer
            .expect_on_event()
            .withf(|event: &ModemEvent| {
                matches!(event, ModemEvent::SessionAttempt { .. } | ModemEvent::SessionReply(_))
            })
            .times(2)
            .return_const(());

        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 1, 0, 0, 0, 0"))
            .write(b"AT+SBDD0\r")
            .read(b"AT+SBDD0\r\nERROR\r\n")
            .build();
        let mut modem = scripted(mock).with_observer(Arc::new(observer));
        assert!(modem.attempt_session().await.is_success());
    }

    #[tokio::test]
    async fn test_session_retrieval_error_aborts() {
        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 1, 1, 7, 5, 0"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .write(b"AT+SBDRB\r")
            .read(b"AT+SBDRB\r\x00\x05hello\x02\x14\r\nERROR\r\n")
            .build();
        let mut modem = scripted(mock);
        let outcome = modem.attempt_session().await;
        assert!(matches!(outcome.result, Err(SbdError::ProtocolMismatch { .. })));
        assert!(outcome.messages.is_empty());
    }

    #[tokio::test]
    async fn test_session_drain_limit() {
        let mut builder = Builder::new();
        builder
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 1, 0, 0, 0, 5"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK);
        for _ in 0..2 {
            builder
                .write(b"AT+SBDIX\r")
                .read(&sbdix("0, 1, 0, 0, 0, 5"))
                .write(b"AT+SBDD0\r")
                .read(CLEAR_OK);
        }
        let mut modem = with_session(
            builder.build(),
            SessionConfig::default().with_max_drain_sessions(2),
        );
        let outcome = modem.attempt_session().await;
        assert!(outcome.is_success());
        assert_eq!(outcome.drain_rounds, 2);
        assert_eq!(modem.statistics().session_attempts, 3);
    }

    #[tokio::test]
    async fn test_session_failed_drain_round_keeps_success() {
        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(&sbdix("0, 1, 1, 7, 5, 1"))
            .write(b"AT+SBDD0\r")
            .read(CLEAR_OK)
            .write(b"AT+SBDRB\r")
            .read(&sbdrb_reply(b"hello"))
            .write(b"AT+SBDIX\r")
            .read(&sbdix("32, 1, 2, 0, 0, 0"))
            .build();
        let mut modem = with_session(mock, SessionConfig::default().with_attempts(1));
        let outcome = modem.attempt_session().await;
        assert!(outcome.is_success());
        assert_eq!(outcome.drain_rounds, 1);
        assert_eq!(outcome.messages, vec![Bytes::from_static(b"hello")]);
    }

    #[tokio::test]
    async fn test_session_parse_error_aborts() {
        let mock = Builder::new()
            .write(b"AT+SBDIX\r")
            .read(b"AT+SBDIX\r\n+SBDIX: 0, 1, 0\r\n")
            .build();
        let mut modem = scripted(mock);
        let outcome = modem.attempt_session().await;
        assert!(matches!(outcome.result, Err(SbdError::Parse(_))));
    }
}
