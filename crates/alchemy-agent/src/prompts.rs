//! Message builders for each agent call.
//!
//! Every prompt leads with the system instructions. Wording lives here so the
//! agents only decide *which* prompt to send.

use alchemy_models::{ComponentData, ConversationHistory, SessionState};

use crate::instructions::SystemInstructions;
use crate::message::Message;

/// Ask whether the request carries enough design detail.
pub fn classification(instructions: &SystemInstructions, request: &str) -> Vec<Message> {
    let prompt = format!(
        r#"Act as a requirements analyst.
Given the following user request: "{request}"
1. Determine if there is enough detail to generate working component code (e.g., styles, colors, labels, layout specifics).
2. If YES, respond only with "yes".
3. If NO, respond only with "no".

Your decision should be based on whether the user has provided enough design-specific information (like color scheme, data structure, size, layout, etc.) to create a visually complete and functional component.
Examples:
User Prompt: "Create a button"
Assistant: no

User Prompt: "Build a blue-themed submit button with rounded corners that says 'Save'"
Assistant: yes

User Prompt: "Make a chart"
Assistant: no

User Prompt: "Build a donut chart showing task completion at 80%. Use pink and white as primary colors."
Assistant: yes

User Prompt: "Create a dashboard widget for analytics"
Assistant: no

User Prompt: "Create a card component showing a user's profile picture, name, and email, with a light gray background."
Assistant: yes"#
    );

    vec![
        Message::system(instructions.as_str()),
        Message::user(prompt),
    ]
}

/// Ask for follow-up questions about an underspecified request.
pub fn clarification(instructions: &SystemInstructions, request: &str) -> Vec<Message> {
    let prompt = format!(
        r#"Act as a UI designer. Ask a series of follow up questions to gather more information about the request to generate the following component: "{request}"
1. Ask about the specific design elements needed (e.g., colors, styles, layout).
2. Inquire about the functionality and behavior of the component (e.g., click handlers, data binding).
3. Clarify the context in which the component will be used (e.g., part of a larger application, standalone).
4. Be concise."#
    );

    vec![
        Message::system(instructions.as_str()),
        Message::user(prompt),
    ]
}

/// Generation messages for the current state.
///
/// A non-empty `validation_feedback` selects the repair prompt; otherwise the
/// component is generated from scratch with the clarification context.
pub fn generation(
    instructions: &SystemInstructions,
    state: &SessionState,
    tool_name: &str,
) -> Vec<Message> {
    let prompt = if state.validation_feedback.trim().is_empty() {
        from_scratch(state, tool_name)
    } else {
        repair(state, tool_name)
    };

    vec![
        Message::system(instructions.as_str()),
        Message::user(prompt),
    ]
}

fn from_scratch(state: &SessionState, tool_name: &str) -> String {
    format!(
        r#"Generate a Material UI component based on this description:
"{request}"
{context}
Create high-quality, production-ready code that matches all specifications.
Use the {tool_name} tool to return the structured data."#,
        request = state.component_request,
        context = history_context(&state.conversation_history),
    )
}

fn repair(state: &SessionState, tool_name: &str) -> String {
    format!(
        r#"This component has received the following feedback from a code reviewer:
## FEEDBACK ##
{feedback}
## END FEEDBACK ##
## COMPONENT ##
{component}
## END COMPONENT ##
Fix the code to address these issues and ensure it meets the user's request:
{request}
Use the {tool_name} tool to return the structured data."#,
        feedback = state.validation_feedback.trim(),
        component = component_block(state.component_data.as_ref()),
        request = state.component_request,
    )
}

fn component_block(component: Option<&ComponentData>) -> String {
    let Some(component) = component else {
        return "(no usable component was produced)".to_string();
    };

    let mut block = String::new();
    if let Some(install) = &component.install_script {
        block.push_str("Install script:\n");
        block.push_str(install);
        block.push('\n');
    }
    block.push_str("Component:\n");
    if let Some(imports) = &component.imports {
        block.push_str(imports);
        block.push('\n');
    }
    block.push_str(&component.code);
    block
}

/// Render clarification exchanges for the generation prompt.
///
/// Empty history renders as an empty string.
pub fn history_context(history: &ConversationHistory) -> String {
    if history.is_empty() {
        return String::new();
    }

    let mut context = String::from("\nContext from follow up questions:\n");
    for exchange in history.exchanges() {
        context.push_str(&format!(
            "Question: {}\nAnswer: {}\n\n",
            exchange.question, exchange.answer
        ));
    }
    context
}

/// Ask a reviewer to check the component against the acceptance checklist.
pub fn validation(
    instructions: &SystemInstructions,
    component: &ComponentData,
    request: &str,
) -> Vec<Message> {
    let prompt = format!(
        r#"Act as a code reviewer skilled in Frontend development. Your task is to review the following code:
## INSTALL SCRIPT ##
{install}

## IMPORTS ##
{imports}

## CODE ##
{code}
Ensure that:
1. It is syntactically correct and adheres to best practices.
2. It is well-structured and easy to read.
3. It includes a default export called MUI Component.
4. The component within the code is fully self contained, can be rendered alone and does not rely on any external variables or data.
5. The component fits the following request: {request}
If the code meets all the above criteria, respond with "yes" only.
If it does not, respond with "no" and provide a brief explanation of the issues, clearly explaining how to fix."#,
        install = component.install_script.as_deref().unwrap_or_default(),
        imports = component.imports.as_deref().unwrap_or_default(),
        code = component.code,
    );

    vec![
        Message::system(instructions.as_str()),
        Message::user(prompt),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;
    use alchemy_models::{ComponentSchema, Exchange, HistoryUpdate, SessionId};

    fn state(request: &str) -> SessionState {
        SessionState::new(SessionId::from("s1"), request, ComponentSchema::Full)
    }

    #[test]
    fn test_classification_quotes_request() {
        let messages = classification(&SystemInstructions::default(), "Create a button");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert!(messages[1].content.contains("\"Create a button\""));
    }

    #[test]
    fn test_generation_from_scratch_includes_history() {
        let mut state = state("Create a button blue");
        state.conversation_history = ConversationHistory::new().apply(HistoryUpdate::Append(vec![
            Exchange::new("What color?", "blue"),
        ]));

        let messages = generation(&SystemInstructions::default(), &state, "ui_gen_function");
        let prompt = &messages[1].content;
        assert!(prompt.starts_with("Generate a Material UI component"));
        assert!(prompt.contains("Question: What color?\nAnswer: blue"));
        assert!(prompt.contains("ui_gen_function"));
        assert!(!prompt.contains("## FEEDBACK ##"));
    }

    #[test]
    fn test_generation_repair_mode_replaces_scratch_prompt() {
        let mut state = state("A blue Save button");
        state.validation_feedback = "no, missing default export".into();
        state.component_data = Some(ComponentData::full(
            "npm i @mui/material",
            "import Button from '@mui/material/Button';",
            "const C = () => <Button/>;",
            "A button",
        ));

        let messages = generation(&SystemInstructions::default(), &state, "ui_gen_function");
        let prompt = &messages[1].content;
        assert!(prompt.contains("## FEEDBACK ##\nno, missing default export"));
        assert!(prompt.contains("Install script:\nnpm i @mui/material"));
        assert!(prompt.contains("const C = () => <Button/>;"));
        assert!(!prompt.contains("Generate a Material UI component"));
    }

    #[test]
    fn test_repair_without_prior_component() {
        let mut state = state("A card");
        state.validation_feedback = "no usable tool call".into();

        let messages = generation(&SystemInstructions::default(), &state, "UiGenTool");
        assert!(messages[1].content.contains("(no usable component was produced)"));
    }

    #[test]
    fn test_history_context_empty() {
        assert_eq!(history_context(&ConversationHistory::new()), "");
    }

    #[test]
    fn test_validation_code_only_component() {
        let component = ComponentData::code_only("export default function MUIComponent() {}");
        let messages = validation(&SystemInstructions::default(), &component, "a card");
        let prompt = &messages[1].content;
        assert!(prompt.contains("## CODE ##\nexport default function MUIComponent() {}"));
        assert!(prompt.contains("fits the following request: a card"));
    }
}
