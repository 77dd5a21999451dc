use serde_json::Value;
use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const ID_FIELD: &str = "id";
pub const TEXT_FIELD: &str = "text";
pub const SOURCE_FIELD: &str = "source";

const TOKENIZER: &str = "text_with_stopwords";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field(ID_FIELD, STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	schema_builder.add_text_field(TEXT_FIELD, TextOptions::default().set_indexing_options(text_field_indexing));
	schema_builder.add_text_field(SOURCE_FIELD, STORED);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let stop_words = vec![
		"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(TOKENIZER, tokenizer);
}

/// All string leaves of a JSON document joined into one searchable body.
pub fn searchable_text(value: &Value) -> String {
	let mut parts = Vec::new();
	collect_strings(value, &mut parts);
	parts.join(" ")
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
	match value {
		Value::String(s) => out.push(s),
		Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
		Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
		_ => {}
	}
}
