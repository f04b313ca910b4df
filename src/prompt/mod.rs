//! Remediation prompt assembly.
//!
//! The template frames the model as a data-center self-healing assistant,
//! embeds the incident and the retrieved knowledge verbatim, and lists the
//! four tasks the report must cover.

/// Placeholder for the incident text in [`REMEDIATION_PROMPT_TEMPLATE`].
pub const INCIDENT_PLACEHOLDER: &str = "{incident}";

/// Placeholder for the joined knowledge context in [`REMEDIATION_PROMPT_TEMPLATE`].
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Fixed instruction template sent to the generation service.
pub const REMEDIATION_PROMPT_TEMPLATE: &str = r"
You are an expert Data Center AI assistant for self-healing infrastructure.
Analyze the following incident or system log and provide a proactive remediation plan.

Incident:
{incident}

Knowledge Base:
{context}

Tasks:
1. Predict potential issues
2. Generate an automatic remediation plan
3. Suggest monitoring improvements
4. Provide concise explanation for each step

Return a structured, actionable report.
";

/// Builds the remediation prompt for `incident` with `context_facts`.
///
/// Facts are joined with a single space; an empty slice yields an empty
/// knowledge section.
///
/// # Example
///
/// ```rust
/// use selfheal::prompt::build_prompt;
///
/// let prompt = build_prompt("Disk at 97%", &["Disk space alerts can lead to service crashes."]);
/// assert!(prompt.contains("Disk at 97%"));
/// assert!(prompt.contains("Disk space alerts can lead to service crashes."));
/// ```
#[must_use]
pub fn build_prompt<S: AsRef<str>>(incident: &str, context_facts: &[S]) -> String {
    let context = join_context(context_facts);

    // Split around the placeholders rather than chained `replace` calls so
    // that braces inside the incident are never re-substituted.
    let (head, rest) = REMEDIATION_PROMPT_TEMPLATE
        .split_once(INCIDENT_PLACEHOLDER)
        .unwrap_or((REMEDIATION_PROMPT_TEMPLATE, ""));
    let (middle, tail) = rest.split_once(CONTEXT_PLACEHOLDER).unwrap_or((rest, ""));

    let mut prompt =
        String::with_capacity(REMEDIATION_PROMPT_TEMPLATE.len() + incident.len() + context.len());
    prompt.push_str(head);
    prompt.push_str(incident);
    prompt.push_str(middle);
    prompt.push_str(&context);
    prompt.push_str(tail);
    prompt
}

/// Joins facts into the single-line knowledge context.
#[must_use]
pub fn join_context<S: AsRef<str>>(facts: &[S]) -> String {
    facts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}
