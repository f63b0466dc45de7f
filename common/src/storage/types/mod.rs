pub mod medical_document;
pub mod system_prompts;
