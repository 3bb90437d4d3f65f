/// Payload of an SSE `data:` line.
pub fn data_field(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}
