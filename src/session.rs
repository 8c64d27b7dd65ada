//! Caller-owned editing state for one prompt template.
//!
//! Placeholders and their partition are derived values: they are cached, but
//! rebuilt from the instructions and known fields on every mutation of either,
//! so they always agree with the current text.
use std::collections::BTreeMap;

use uuid::Uuid;

use crate::judge::validation::{placeholder_gate, validate_prompt, PromptValidationResponse, ValidatePromptParams};
use crate::prompt::constructor::{build_full_prompt, get_prompt_template, PromptTemplate};
use crate::prompt::placeholders::{
    extract_placeholders, missing_sample_values, validate_placeholders, PlaceholderPartition,
};
use crate::prompt::schema::OutputSchema;
use crate::relevance::client::{JudgeTransport, QuerySetSource};
use crate::relevance::fields::{fetch_known_fields, FieldLoad, FieldLoadTicket, KnownFieldLoader};

#[derive(Debug)]
pub struct PromptSession {
    id: Uuid,
    output_schema: OutputSchema,
    user_instructions: String,
    placeholders: Vec<String>,
    known_fields: Vec<String>,
    partition: PlaceholderPartition,
    placeholder_values: BTreeMap<String, String>,
    field_loader: KnownFieldLoader,
    last_validation: Option<PromptValidationResponse>,
}

impl Default for PromptSession {
    fn default() -> Self {
        Self::new(OutputSchema::default())
    }
}

impl PromptSession {
    pub fn new(output_schema: OutputSchema) -> Self {
        PromptSession {
            id: Uuid::new_v4(),
            output_schema,
            user_instructions: String::new(),
            placeholders: Vec::new(),
            known_fields: Vec::new(),
            partition: PlaceholderPartition::default(),
            placeholder_values: BTreeMap::new(),
            field_loader: KnownFieldLoader::new(),
            last_validation: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn output_schema(&self) -> OutputSchema {
        self.output_schema
    }

    pub fn set_output_schema(&mut self, schema: OutputSchema) {
        self.output_schema = schema;
    }

    pub fn user_instructions(&self) -> &str {
        &self.user_instructions
    }

    pub fn set_user_instructions(&mut self, text: impl Into<String>) {
        self.user_instructions = text.into();
        self.placeholders = extract_placeholders(&self.user_instructions);
        self.revalidate();
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn known_fields(&self) -> &[String] {
        &self.known_fields
    }

    pub fn set_known_fields(&mut self, fields: Vec<String>) {
        self.known_fields = fields;
        self.revalidate();
    }

    pub fn partition(&self) -> &PlaceholderPartition {
        &self.partition
    }

    pub fn valid_placeholders(&self) -> &[String] {
        &self.partition.valid_placeholders
    }

    pub fn invalid_placeholders(&self) -> &[String] {
        &self.partition.invalid_placeholders
    }

    pub fn set_placeholder_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.placeholder_values.insert(name.into(), value.into());
    }

    pub fn placeholder_values(&self) -> &BTreeMap<String, String> {
        &self.placeholder_values
    }

    pub fn last_validation(&self) -> Option<&PromptValidationResponse> {
        self.last_validation.as_ref()
    }

    fn revalidate(&mut self) {
        self.partition = validate_placeholders(&self.placeholders, &self.known_fields);
    }

    /// Start loading fields for a newly selected query set. Any load still in
    /// flight becomes stale.
    pub fn begin_field_load(&mut self, query_set_id: Option<&str>) -> FieldLoadTicket {
        self.field_loader.begin(query_set_id)
    }

    /// Apply a finished load unless a newer one was started since. Returns
    /// whether it was applied.
    pub fn apply_field_load(&mut self, load: FieldLoad) -> bool {
        if !self.field_loader.is_current(load.token) {
            tracing::debug!(session = %self.id, token = load.token, "Discarding stale field load");
            return false;
        }
        self.set_known_fields(load.fields);
        true
    }

    /// Select a query set and load its fields in one step.
    pub async fn select_query_set(&mut self, source: &dyn QuerySetSource, query_set_id: Option<&str>) {
        let ticket = self.begin_field_load(query_set_id);
        let load = fetch_known_fields(source, &ticket).await;
        self.apply_field_load(load);
    }

    pub fn full_prompt(&self) -> String {
        build_full_prompt(self.output_schema, &self.user_instructions)
    }

    pub fn template(&self) -> PromptTemplate {
        get_prompt_template(self.output_schema, &self.user_instructions)
    }

    /// Placeholders still lacking a sample value.
    pub fn missing_values(&self) -> Vec<String> {
        missing_sample_values(&self.placeholders, &self.placeholder_values)
    }

    pub fn can_validate(&self) -> bool {
        placeholder_gate(&self.placeholders, &self.known_fields, &self.placeholder_values).is_none()
    }

    /// Try the current template against the judge model and store the result.
    ///
    /// Unknown placeholders or missing sample values block the call locally.
    pub async fn run_validation(
        &mut self,
        transport: Option<&dyn JudgeTransport>,
        model_id: Option<&str>,
        search_configuration_list: Vec<String>,
        context_fields: Vec<String>,
    ) -> &PromptValidationResponse {
        let blocked = placeholder_gate(&self.placeholders, &self.known_fields, &self.placeholder_values);
        let result = if let Some(blocked) = blocked {
            blocked
        } else {
            let params = ValidatePromptParams {
                model_id: model_id.map(str::to_string),
                placeholder_values: self.placeholder_values.clone(),
                search_configuration_list,
                context_fields,
                output_schema: self.output_schema,
                user_instructions: self.user_instructions.clone(),
                ..Default::default()
            };
            validate_prompt(transport, &params).await
        };
        tracing::info!(session = %self.id, success = result.success, "Prompt validation finished");
        self.last_validation.insert(result)
    }
}
