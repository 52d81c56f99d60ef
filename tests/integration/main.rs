//! Integration tests against the public `dindin` API.

mod mock_mailer;
mod queue_flow;
mod simulation;
