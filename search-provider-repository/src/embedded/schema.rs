//! Embedded index schema.
//!
//! Documents are schemaless on the way in, so the index keeps four fields:
//! - `id`: raw keyword, used for exact lookups and replacement
//! - `_text_`: catch-all full-text field fed with every scalar value
//! - `_fields_`: the whole document as an indexed JSON object, so that
//!   `field:value` queries resolve against the document's own field names
//! - `_source_`: the whole document as JSON, stored only

use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};

use search_provider_shared::ID_FIELD;

/// Catch-all field searched by unqualified query terms.
pub const TEXT_FIELD: &str = "_text_";

/// Indexed JSON object holding every document field by name.
pub const FIELDS_FIELD: &str = "_fields_";

/// Stored JSON rendering of the original document.
pub const SOURCE_FIELD: &str = "_source_";

/// Handles to the schema fields.
#[derive(Debug, Clone, Copy)]
pub struct SchemaFields {
    pub id: Field,
    pub text: Field,
    pub fields: Field,
    pub source: Field,
}

/// Build the index schema and its field handles.
pub fn build_schema() -> (Schema, SchemaFields) {
    let mut builder = Schema::builder();
    let id = builder.add_text_field(ID_FIELD, STRING | STORED);
    let text = builder.add_text_field(TEXT_FIELD, TEXT);
    let fields = builder.add_json_field(FIELDS_FIELD, TEXT);
    let source = builder.add_text_field(SOURCE_FIELD, STORED);

    (
        builder.build(),
        SchemaFields {
            id,
            text,
            fields,
            source,
        },
    )
}
