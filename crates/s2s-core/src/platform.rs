//! Platform detection and platform-specific parameters.
//!
//! Each platform contributes its own descriptive fields plus zero or more
//! device identifiers. An identifier is only accepted when it is exactly
//! [`IDENTIFIER_LEN`] characters long (the length of a hyphenated UUID).

use crate::event::{non_empty, SegmentEvent};
use crate::params::{keys, OutboundParams};

/// Required length of every device or web identifier.
pub const IDENTIFIER_LEN: usize = 36;

const UNKNOWN_BUNDLE_ID: &str = "segment.unknown.bundleId";
const UNKNOWN_WEB_BUNDLE_ID: &str = "unknown_web_bundleId";

/// Vendor-specific identifier overrides carried in event properties.
pub mod properties {
    pub const IDFA: &str = "singularIDFA";
    pub const IDFV: &str = "singularIDFV";
    pub const GAID: &str = "singularGAID";
    pub const ASID: &str = "singularASID";
    pub const AMID: &str = "singularAMID";
    pub const OAID: &str = "singularOAID";
    pub const SDID: &str = "singularSDID";
    pub const WEB_BUNDLE_ID: &str = "singularWebBundleId";
}

/// Source platform of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
    Web,
    Unknown,
}

/// Letter case an identifier is normalised to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Case {
    Upper,
    Lower,
}

/// An accepted device identifier, ready to be written as a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierField {
    pub key: &'static str,
    pub value: String,
}

impl IdentifierField {
    fn accept(key: &'static str, candidate: Option<&str>, case: Case) -> Option<Self> {
        let candidate = candidate?;
        if candidate.chars().count() != IDENTIFIER_LEN {
            return None;
        }
        let value = match case {
            Case::Upper => candidate.to_uppercase(),
            Case::Lower => candidate.to_lowercase(),
        };
        Some(Self { key, value })
    }
}

impl Platform {
    /// Resolve the platform from the integration library name, falling back
    /// to the device type. Returns `None` when the event carries neither.
    pub fn detect(event: &SegmentEvent) -> Option<Self> {
        if let Some(library) = event.library_name() {
            let platform = Self::from_library(library);
            if platform != Self::Unknown {
                return Some(platform);
            }
            return Some(event.device_type().map_or(platform, Self::from_device_type));
        }

        event.device_type().map(Self::from_device_type)
    }

    pub fn from_library(name: &str) -> Self {
        match name {
            "analytics-ios" => Self::Ios,
            "analytics-android" => Self::Android,
            "analytics.js" => Self::Web,
            _ => Self::Unknown,
        }
    }

    pub fn from_device_type(device_type: &str) -> Self {
        match device_type.to_ascii_lowercase().as_str() {
            "ios" => Self::Ios,
            "android" => Self::Android,
            _ => Self::Unknown,
        }
    }

    /// Value of the `p` parameter.
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Self::Ios => Some("iOS"),
            Self::Android => Some("Android"),
            Self::Web => Some("Web"),
            Self::Unknown => None,
        }
    }

    /// Write platform fields into `params` and return the identifiers that
    /// were accepted.
    pub fn apply(self, event: &SegmentEvent, params: &mut OutboundParams) -> Vec<IdentifierField> {
        if let Some(name) = self.as_str() {
            params.set(keys::PLATFORM, name);
        }

        let identifiers = match self {
            Self::Ios => {
                apply_mobile(event, params);
                ios_identifiers(event, params)
            }
            Self::Android => {
                apply_mobile(event, params);
                android_identifiers(event)
            }
            Self::Web => web_identifiers(event, params),
            Self::Unknown => Vec::new(),
        };

        for id in &identifiers {
            params.set(id.key, id.value.clone());
        }
        identifiers
    }
}

fn apply_mobile(event: &SegmentEvent, params: &mut OutboundParams) {
    let device = event.device();
    params.set(
        keys::BUNDLE_ID,
        event.app_namespace().unwrap_or(UNKNOWN_BUNDLE_ID),
    );
    params.set(keys::OS_VERSION, event.os_version().unwrap_or_default());
    params.set(
        keys::MANUFACTURER,
        device.and_then(|d| d.manufacturer.as_deref()).unwrap_or_default(),
    );
    params.set(
        keys::MODEL,
        device.and_then(|d| d.model.as_deref()).unwrap_or_default(),
    );
}

fn ios_identifiers(event: &SegmentEvent, params: &mut OutboundParams) -> Vec<IdentifierField> {
    let device = event.device();
    let idfa_source = event
        .property_str(properties::IDFA)
        .or_else(|| non_empty(device.and_then(|d| d.advertising_id.as_deref())));
    let idfv_source = event
        .property_str(properties::IDFV)
        .or_else(|| non_empty(device.and_then(|d| d.id.as_deref())));

    let idfa = IdentifierField::accept(keys::IDFA, idfa_source, Case::Upper);
    let idfv = IdentifierField::accept(keys::IDFV, idfv_source, Case::Upper);

    // An explicit tracking flag wins over inferring consent from the IDFA.
    let authorized = device
        .and_then(|d| d.ad_tracking_enabled)
        .unwrap_or(idfa.is_some());
    params.set(keys::ATT_STATUS, if authorized { "3" } else { "0" });

    [idfa, idfv].into_iter().flatten().collect()
}

fn android_identifiers(event: &SegmentEvent) -> Vec<IdentifierField> {
    let gaid_source = event.property_str(properties::GAID).or_else(|| {
        non_empty(event.device().and_then(|d| d.advertising_id.as_deref()))
    });

    [
        IdentifierField::accept(keys::AIFA, gaid_source, Case::Lower),
        IdentifierField::accept(keys::ASID, event.property_str(properties::ASID), Case::Lower),
        IdentifierField::accept(keys::AMID, event.property_str(properties::AMID), Case::Lower),
        IdentifierField::accept(keys::OAID, event.property_str(properties::OAID), Case::Lower),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn web_identifiers(event: &SegmentEvent, params: &mut OutboundParams) -> Vec<IdentifierField> {
    params.set(
        keys::BUNDLE_ID,
        event
            .property_str(properties::WEB_BUNDLE_ID)
            .unwrap_or(UNKNOWN_WEB_BUNDLE_ID),
    );

    IdentifierField::accept(keys::SDID, event.property_str(properties::SDID), Case::Lower)
        .into_iter()
        .collect()
}
