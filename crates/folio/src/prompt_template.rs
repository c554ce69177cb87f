use serde::Serialize;
use std::fs;
use std::path::Path;
use tera::{Context, Error as TeraError, Tera};

use crate::configuration::OwnerProfile;
use crate::models::tool::Tool;

/// Built-in system instruction, rendered with the owner profile and the registered tools
pub const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

pub fn load_prompt_file<T: Serialize>(
    template_file: &Path,
    context_data: &T,
) -> Result<String, TeraError> {
    let template_content = fs::read_to_string(template_file)
        .map_err(|e| TeraError::chain("Failed to read template file", e))?;
    load_prompt(&template_content, context_data)
}

#[derive(Serialize)]
struct SystemPromptContext<'a> {
    owner: &'a OwnerProfile,
    first_name: &'a str,
    tools: &'a [Tool],
}

/// Render the system instruction, from `template_file` when given, else the built-in template
pub fn system_prompt(
    owner: &OwnerProfile,
    tools: &[Tool],
    template_file: Option<&Path>,
) -> Result<String, TeraError> {
    let context = SystemPromptContext {
        owner,
        first_name: owner.first_name(),
        tools,
    };
    match template_file {
        Some(path) => load_prompt_file(path, &context),
        None => load_prompt(SYSTEM_TEMPLATE, &context),
    }
}
