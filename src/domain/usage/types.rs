//! CloudStack usage type codes and their display names

use std::borrow::Cow;

/// A usage type code paired with the name shown to operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageType {
    pub code: i64,
    pub name: &'static str,
}

const fn usage_type(code: i64, name: &'static str) -> UsageType {
    UsageType { code, name }
}

/// Usage types reported by `listUsageRecords`, ordered by code
pub static USAGE_TYPE_MAP: [UsageType; 18] = [
    usage_type(1, "Running VM"),
    usage_type(2, "Allocated VM"),
    usage_type(3, "IP Address"),
    usage_type(4, "Network Usage"),
    usage_type(5, "VPN Users"),
    usage_type(6, "Volume"),
    usage_type(7, "Template"),
    usage_type(8, "ISO"),
    usage_type(9, "Snapshot"),
    usage_type(10, "Security Group"),
    usage_type(11, "Load Balancer"),
    usage_type(12, "Port Forwarding Rule"),
    usage_type(13, "Network Offering"),
    usage_type(14, "VPC"),
    usage_type(15, "CPU"),
    usage_type(16, "Memory"),
    usage_type(17, "Primary Storage"),
    usage_type(18, "Secondary Storage"),
];

/// Resolves a code to its display name, falling back to the code itself
pub fn usage_type_name(code: i64) -> Cow<'static, str> {
    USAGE_TYPE_MAP
        .iter()
        .find(|usage_type| usage_type.code == code)
        .map(|usage_type| Cow::Borrowed(usage_type.name))
        .unwrap_or_else(|| Cow::Owned(code.to_string()))
}

/// Reverse lookup of [`usage_type_name`]
#[cfg(test)]
pub(crate) fn usage_type_code(name: &str) -> Option<i64> {
    USAGE_TYPE_MAP
        .iter()
        .find(|usage_type| usage_type.name == name)
        .map(|usage_type| usage_type.code)
        .or_else(|| name.parse().ok())
}
