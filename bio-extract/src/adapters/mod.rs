/// OpenAI chat models through Rig, as a `StructuredService`.
pub mod openai;
