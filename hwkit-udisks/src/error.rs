// SPDX-License-Identifier: GPL-3.0-only

//! Translation of D-Bus failures into [`HwError`]s.

use hwkit_contracts::{HwError, HwErrorKind};

const UDISKS_ERROR: &str = "org.freedesktop.UDisks2.Error.";

/// Classify a UDisks2 error name (`org.freedesktop.UDisks2.Error.DeviceBusy`).
pub fn kind_for_error_name(name: &str) -> HwErrorKind {
    let Some(short) = name.strip_prefix(UDISKS_ERROR) else {
        return HwErrorKind::TransportFailure;
    };

    match short {
        "DeviceBusy" | "AlreadyMounted" | "NotMounted" | "MountedBySystem" | "Cancelled" => {
            HwErrorKind::OperationRejected
        }
        s if s.starts_with("NotAuthorized") => HwErrorKind::OperationRejected,
        "Timedout" => HwErrorKind::Timeout,
        "NotSupported" => HwErrorKind::UnsupportedCapability,
        _ => HwErrorKind::TransportFailure,
    }
}

/// Map a failed call; `what` names the request for the message.
pub fn map_zbus_error(what: &str, error: zbus::Error) -> HwError {
    match &error {
        zbus::Error::MethodError(name, detail, _) => {
            let message = match detail {
                Some(detail) => format!("{what}: {detail}"),
                None => format!("{what}: {}", name.as_str()),
            };
            HwError::new(kind_for_error_name(name.as_str()), message)
        }
        _ => HwError::transport(format!("{what}: {error}")),
    }
}

/// Map a failed UDisks2 method call.
pub fn map_udisks_error(what: &str, error: udisks2::Error) -> HwError {
    use udisks2::Error as E;

    let message = format!("{what}: {error}");
    let kind = match error {
        E::Zbus(inner) => return map_zbus_error(what, inner),
        E::DeviceBusy
        | E::AlreadyMounted
        | E::NotMounted
        | E::MountedByOtherUser
        | E::AlreadyUnmounting
        | E::OptionNotPermitted
        | E::WouldWakeup
        | E::Cancelled
        | E::AlreadyCancelled
        | E::NotAuthorized
        | E::NotAuthorizedCanObtain
        | E::NotAuthorizedDismissed => HwErrorKind::OperationRejected,
        E::TimedOut => HwErrorKind::Timeout,
        E::NotSupported => HwErrorKind::UnsupportedCapability,
        E::Failed | E::Iscsi(_) => HwErrorKind::TransportFailure,
    };
    HwError::new(kind, message)
}
