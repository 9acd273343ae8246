use crmseed_core::SampleValue;

/// Cut every non-null value whose rendering exceeds `max_len` characters.
///
/// Values already within the cap keep their type, so applying the cap twice
/// changes nothing. Returns the number of values cut.
pub fn truncate_column(values: &mut [SampleValue], max_len: usize) -> u64 {
    let mut truncated = 0;
    for value in values.iter_mut() {
        let Some(rendered) = value.render() else {
            continue;
        };
        if rendered.chars().count() <= max_len {
            continue;
        }
        *value = SampleValue::Text(rendered.chars().take(max_len).collect());
        truncated += 1;
    }
    truncated
}
