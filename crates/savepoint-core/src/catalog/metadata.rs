//! Per-title `meta.xml` parsing.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use crate::TitleId;

/// Fields extracted from one title's metadata document.
#[derive(Debug, Clone, Default)]
pub struct TitleMeta {
    pub id: TitleId,
    pub name: String,
    pub publisher: String,
}

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("malformed metadata document: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("metadata has no parseable title id")]
    MissingId,
}

enum Field {
    Id,
    Name,
    Publisher,
}

/// Parse a metadata document. The title id is mandatory; name and
/// publisher default to empty, which downstream name derivation handles.
pub fn parse_meta_xml(bytes: &[u8]) -> Result<TitleMeta, MetaError> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut meta = TitleMeta::default();
    let mut current: Option<Field> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                current = match e.name().as_ref() {
                    b"title_id" => Some(Field::Id),
                    b"shortname_en" => Some(Field::Name),
                    b"publisher_en" => Some(Field::Publisher),
                    _ => None,
                };
            }
            Event::Text(t) => {
                if let Some(field) = &current {
                    let text = match t.unescape() {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => String::new(),
                    };
                    match field {
                        Field::Id => {
                            meta.id = TitleId::from_str_radix(
                                text.trim().trim_start_matches("0x"),
                                16,
                            )
                            .unwrap_or(0);
                        }
                        Field::Name => meta.name = text,
                        Field::Publisher => meta.publisher = text,
                    }
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if meta.id == 0 {
        return Err(MetaError::MissingId);
    }
    Ok(meta)
}
