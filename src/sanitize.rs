// Minimal sanitization helpers for table filters

pub fn is_safe_identifier(id: &str) -> bool {
  // Oracle identifiers: letters, digits, underscore, `$` and `#`; optional dot for schema.table
  // Disallow quotes, spaces, semicolons, comment markers
  if id.is_empty() || id.len() > 128 { return false; }
  if !id.chars().next().map_or(false, |c| c.is_ascii_alphabetic()) { return false; }
  let mut dot_count = 0;
  for ch in id.chars() {
    match ch {
      'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '$' | '#' => {}
      '.' => { dot_count += 1; if dot_count > 1 { return false; } }
      _ => return false,
    }
  }
  !id.ends_with('.')
}
