use indexmap::IndexSet;
use strum::Display;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum PathParseError {
  #[strum(to_string = "unclosed '{{' at position {position} in segment '{segment}'")]
  UnclosedBrace { segment: String, position: usize },
  #[strum(to_string = "empty parameter '{{}}' in segment '{segment}'")]
  EmptyParameter { segment: String },
  #[strum(to_string = "unmatched '}}' at position {position} in segment '{segment}'")]
  UnmatchedClosingBrace { segment: String, position: usize },
  #[strum(to_string = "nested '{{' at position {position} in segment '{segment}'")]
  NestedBraces { segment: String, position: usize },
}

impl std::error::Error for PathParseError {}

/// Placeholder names of a path template such as `/users/{id}/files/{name}.{ext}`, in order.
pub fn parse_placeholders(path: &str) -> Result<IndexSet<String>, PathParseError> {
  let mut names = IndexSet::new();
  for segment in path.split('/') {
    names.extend(segment_placeholders(segment)?.into_iter().map(str::to_string));
  }
  Ok(names)
}

fn segment_placeholders(segment: &str) -> Result<Vec<&str>, PathParseError> {
  let mut names = vec![];
  let mut rest = segment;
  let mut offset = 0;

  while let Some(open_pos) = rest.find('{') {
    if let Some(stray_close) = rest[..open_pos].find('}') {
      return Err(PathParseError::UnmatchedClosingBrace {
        segment: segment.to_string(),
        position: offset + stray_close,
      });
    }

    let after_open = &rest[open_pos + 1..];
    let Some(close_pos) = after_open.find('}') else {
      return Err(PathParseError::UnclosedBrace {
        segment: segment.to_string(),
        position: offset + open_pos,
      });
    };

    if let Some(nested) = after_open[..close_pos].find('{') {
      return Err(PathParseError::NestedBraces {
        segment: segment.to_string(),
        position: offset + open_pos + 1 + nested,
      });
    }

    let name = &after_open[..close_pos];
    if name.is_empty() {
      return Err(PathParseError::EmptyParameter {
        segment: segment.to_string(),
      });
    }
    names.push(name);

    let consumed = open_pos + 1 + close_pos + 1;
    offset += consumed;
    rest = &rest[consumed..];
  }

  if let Some(stray_close) = rest.find('}') {
    return Err(PathParseError::UnmatchedClosingBrace {
      segment: segment.to_string(),
      position: offset + stray_close,
    });
  }

  Ok(names)
}
