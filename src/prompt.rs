use std::fmt::Write;

use crate::context::{ContextMode, FinancialContext};
use crate::schema::UserType;

const INSTRUCTIONS: &[&str] = &[
    "Answer in a warm, professional tone and keep the reply concise.",
    "Ground every figure you quote in the financial data above; never invent numbers.",
    "When the data is missing or incomplete, say so and give general guidance instead.",
    "Prefer concrete, actionable next steps over generic advice.",
    "Do not ask for passwords, card numbers or other credentials.",
];

/// Assembles the model prompt for one chat turn.
pub fn build_prompt(
    user_type: UserType,
    user_id: &str,
    context: &FinancialContext,
    message: &str,
) -> String {
    let audience = match user_type {
        UserType::Company => "a business banking customer",
        UserType::Personal => "a personal banking customer",
    };
    let source = match context.mode {
        ContextMode::Enhanced => "automated analysis tools",
        ContextMode::Traditional => "account records",
    };

    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are a financial advisor assistant helping {} (id: {}).",
        audience, user_id
    );
    let _ = writeln!(
        prompt,
        "\nFinancial data ({}):\n{}",
        source,
        context.body.trim()
    );

    if !context.recommendations.is_empty() {
        prompt.push_str("\nSuggested focus points:\n");
        for (i, recommendation) in context.recommendations.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {}", i + 1, recommendation);
        }
    }

    prompt.push_str("\nGuidelines:\n");
    for instruction in INSTRUCTIONS {
        let _ = writeln!(prompt, "- {}", instruction);
    }

    let _ = write!(prompt, "\nCustomer question: {}", message.trim());
    prompt
}
