//! # kc-gateway-api
//!
//! HTTP boundary of the admin gateway.
//!
//! Every route lives under `/api/keycloak` and maps one request to one
//! [`AdminGateway`](kc_gateway::AdminGateway) operation. Successful commands
//! answer `200` with the body `OK`; queries answer with JSON.
//!
//! ## Usage
//!
//! ```ignore
//! use kc_gateway_api::{gateway_router, GatewayState};
//!
//! let app = gateway_router().with_state(GatewayState::new(gateway, false));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dto;
pub mod error;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use router::{gateway_router, API_PREFIX};
pub use state::GatewayState;
