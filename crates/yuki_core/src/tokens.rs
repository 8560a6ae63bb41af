/// Heuristic token count used when the server reports no counters.
///
/// Roughly four characters per token, never less than one.
///
/// ```
/// assert_eq!(yuki_core::estimate_tokens(10, 10), 5);
/// assert_eq!(yuki_core::estimate_tokens(0, 0), 1);
/// ```
pub fn estimate_tokens(prompt_chars: usize, response_chars: usize) -> u64 {
    ((prompt_chars + response_chars) / 4).max(1) as u64
}
