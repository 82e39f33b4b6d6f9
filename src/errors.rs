pub const JOIN_FALLBACK_MESSAGE: &str = "Failed to join battle";
pub const USER_REJECTED_MESSAGE: &str = "Transaction rejected by user";

const REVERT_MARKERS: [&str; 3] = [
    "reverted with reason string",
    "execution reverted:",
    "reason:",
];

const REJECTION_MARKERS: [&str; 3] = ["user rejected", "user denied", "rejected by user"];

const RPC_MESSAGE_MARKER: &str = "message: ";
const RPC_DATA_MARKER: &str = ", data:";

const NOISE_MARKERS: [&str; 5] = [
    "Request Arguments:",
    "Details:",
    "Version:",
    "Contract Call:",
    "(code:",
];

/// Best-effort short message from an error rendered by the call layer.
/// `None` means nothing readable was found.
pub fn extract_error_message(raw: &str) -> Option<String> {
    if let Some(reason) = revert_reason(raw) {
        return Some(reason);
    }
    let lowered = raw.to_lowercase();
    if REJECTION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        return Some(USER_REJECTED_MESSAGE.to_string());
    }
    if let Some(message) = rpc_message(raw) {
        return Some(message);
    }
    let first_line = raw.lines().map(str::trim).find(|line| !line.is_empty())?;
    let cut = NOISE_MARKERS
        .iter()
        .filter_map(|marker| first_line.find(marker))
        .min()
        .unwrap_or(first_line.len());
    let message = first_line[..cut].trim().trim_end_matches([':', '.']).trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

pub fn join_error_message(raw: &str) -> String {
    extract_error_message(raw).unwrap_or_else(|| JOIN_FALLBACK_MESSAGE.to_string())
}

fn revert_reason(raw: &str) -> Option<String> {
    REVERT_MARKERS.iter().find_map(|marker| {
        let start = raw.find(marker)? + marker.len();
        let rest = raw[start..].trim_start();
        let reason = match rest.chars().next() {
            Some(quote @ ('\'' | '"')) => {
                let inner = &rest[1..];
                inner.split(quote).next().unwrap_or(inner)
            }
            _ => {
                let line = rest.lines().next().unwrap_or(rest);
                &line[..cut_at(line, &[RPC_DATA_MARKER])]
            }
        };
        let reason = reason.trim();
        (!reason.is_empty()).then(|| reason.to_string())
    })
}

/// Message field of a JSON-RPC error as rendered by the provider,
/// `(code: -32000, message: ..., data: None)`.
fn rpc_message(raw: &str) -> Option<String> {
    let start = raw.find(RPC_MESSAGE_MARKER)? + RPC_MESSAGE_MARKER.len();
    let rest = &raw[start..];
    let message = rest[..cut_at(rest, &[RPC_DATA_MARKER, ")"])].trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// Byte offset of the earliest of `markers` in `text`, or its length.
fn cut_at(text: &str, markers: &[&str]) -> usize {
    markers
        .iter()
        .filter_map(|marker| text.find(marker))
        .min()
        .unwrap_or(text.len())
}
