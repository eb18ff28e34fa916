//! Domain primitives, aggregates and application state.
//!
//! Purpose: define the strongly typed entities of the heist board and the
//! stateful services (auth session, heist watches, forms, guards) that sit
//! between the ports and the inbound adapters. Nothing here knows about
//! HTTP; adapters hand services their ports explicitly.
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic error payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User, UserId, Codename, UserProfile: member identity.
//! - Heist, HeistId, HeistFilter, NewHeist: heists and their queries.
//! - AuthSession, AuthState: published sign-in state.
//! - HeistWatch, HeistListWatch: live heist lookups.
//! - forms, views, guards: page-level behaviour.

pub mod auth;
pub mod codename;
pub mod document;
pub mod error;
pub mod forms;
pub mod guards;
pub mod heist;
pub mod heist_list_watch;
pub mod heist_watch;
pub mod liveness;
pub mod ports;
pub mod route;
pub mod session;
pub mod trace_id;
pub mod user;
pub mod validation;
pub mod views;

pub use self::auth::{AuthErrorCode, Credentials};
pub use self::codename::{generate_codename, generate_codename_with};
pub use self::document::{Document, FieldValue, Fields, Predicate};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::forms::{
    Assignees, CreateHeistForm, DRAFT_KEY, FormError, FormPhase, HeistDraft, LoginForm,
    SignupForm,
};
pub use self::guards::{GuardKind, GuardView, RouteGuard};
pub use self::heist::{
    FinalStatus, HEIST_DURATION, Heist, HeistDecodeError, HeistFilter, HeistId, NewHeist,
    UnknownHeistFilter,
};
pub use self::heist_list_watch::{HeistList, HeistListWatch};
pub use self::heist_watch::{HeistLookup, HeistWatch, HeistWatchError};
pub use self::liveness::Liveness;
pub use self::route::Route;
pub use self::session::{AuthSession, AuthState};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Codename, UNKNOWN_CODENAME, User, UserId, UserProfile, UserValidationError};
pub use self::validation::FieldErrors;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use pocket_heist::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
