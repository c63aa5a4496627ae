// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed prompt template for UX analysis

/// Model identifier used for every analysis
pub const ANALYSIS_MODEL: &str = "gpt-4";

/// Sampling temperature used for every analysis
pub const ANALYSIS_TEMPERATURE: f32 = 0.7;

pub const SYSTEM_PROMPT: &str = "You are a UX expert analyzing websites. Provide detailed analysis focusing on usability, accessibility, and conversion optimization.";

const USER_INSTRUCTIONS: &str = r#"Analyze this website content and provide UX recommendations. Respond in valid JSON format matching this structure:
{
  "overview": "string",
  "issues": [{"severity": "critical|major|minor", "description": "string", "recommendation": "string"}],
  "recommendations": ["string"]
}"#;

/// Build the user message. Page content is appended verbatim.
pub fn user_prompt(content: &str) -> String {
    format!("{}\n\nWebsite content: {}", USER_INSTRUCTIONS, content)
}
