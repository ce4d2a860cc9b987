//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP-style status code carried by responses and acknowledgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct HttpStatus(u16);

impl HttpStatus {
    /// 200
    pub const OK: Self = Self(200);
    /// 201
    pub const CREATED: Self = Self(201);
    /// 204
    pub const NO_CONTENT: Self = Self(204);
    /// 400
    pub const BAD_REQUEST: Self = Self(400);
    /// 403
    pub const FORBIDDEN: Self = Self(403);
    /// 404
    pub const NOT_FOUND: Self = Self(404);
    /// 408
    pub const REQUEST_TIMEOUT: Self = Self(408);
    /// 409
    pub const CONFLICT: Self = Self(409);
    /// 424
    pub const FAILED_DEPENDENCY: Self = Self(424);
    /// 500
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// Wrap a raw code, rejecting values outside `100..=599`.
    pub fn new(code: u16) -> Option<Self> {
        (100..=599).contains(&code).then_some(Self(code))
    }

    /// Numeric code.
    pub fn code(self) -> u16 {
        self.0
    }

    /// 2xx
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    /// 4xx
    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.0)
    }

    /// 5xx
    pub fn is_server_error(self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl TryFrom<u16> for HttpStatus {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::new(code).ok_or_else(|| format!("status {code} is outside 100..=599"))
    }
}

impl From<HttpStatus> for u16 {
    fn from(status: HttpStatus) -> Self {
        status.0
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
