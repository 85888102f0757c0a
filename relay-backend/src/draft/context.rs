use crate::models::{Direction, EntryKind, HistoryEntry, KnowledgeItem, Thread};

/// Prompt assembly options. Language and word ceiling come from service
/// configuration; callers may narrow the history window per request.
#[derive(Debug, Clone)]
pub struct PromptOptions {
    pub language: String,
    pub max_words: usize,
    pub max_history_turns: usize,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            language: "Spanish".to_string(),
            max_words: 60,
            max_history_turns: 20,
        }
    }
}

/// Assemble a bounded, grounded prompt for draft generation.
///
/// Fixed section order: role instruction, knowledge block, attribution
/// block, conversation history, explicit "reply to this" target. Missing
/// attribution fields are rendered as "N/A" rather than omitted so the
/// prompt shape stays stable. An empty history still yields a valid prompt.
pub fn build_prompt(
    thread: &Thread,
    items: &[KnowledgeItem],
    history: &[HistoryEntry],
    opts: &PromptOptions,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are a sales assistant drafting a reply to a customer. \
         Write the reply in {} and keep it under {} words.\n\n",
        opts.language, opts.max_words
    ));

    prompt.push_str("Product catalog:\n");
    for item in items {
        prompt.push_str(&format!(
            "- {} ({}): {} {} | {}\n",
            item.name, item.category, item.price, item.currency, item.description
        ));
    }
    prompt.push('\n');

    let attribution = &thread.attribution;
    prompt.push_str("Lead attribution:\n");
    prompt.push_str(&format!(
        "source: {}\n",
        attribution.source.as_deref().unwrap_or("N/A")
    ));
    prompt.push_str(&format!(
        "campaign: {}\n",
        attribution.campaign.as_deref().unwrap_or("N/A")
    ));
    prompt.push_str(&format!(
        "term: {}\n",
        attribution.term.as_deref().unwrap_or("N/A")
    ));
    prompt.push('\n');

    // Internal notes are never part of the customer-facing exchange.
    let conversation: Vec<&HistoryEntry> = history
        .iter()
        .filter(|e| e.kind == EntryKind::Message)
        .collect();
    let window_start = conversation.len().saturating_sub(opts.max_history_turns);

    prompt.push_str("Conversation:\n");
    for entry in &conversation[window_start..] {
        let sender = match entry.direction {
            Direction::Inbound => "customer",
            Direction::Outbound => "agent",
        };
        prompt.push_str(&format!("{}: {}\n", sender, entry.body));
    }
    prompt.push('\n');

    // Providers anchor better on an explicit cue than on inferring the
    // target from the transcript tail.
    if let Some(last_inbound) = conversation
        .iter()
        .rev()
        .find(|e| e.direction == Direction::Inbound)
    {
        prompt.push_str(&format!(
            "Reply to this customer message: \"{}\"\n",
            last_inbound.body
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attribution, ChannelKind};
    use chrono::Utc;

    fn make_thread(attribution: Attribution) -> Thread {
        Thread {
            id: "t-1".to_string(),
            owner: Some("ana".to_string()),
            phone: Some("600112233".to_string()),
            email: None,
            attribution,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn entry(id: i64, direction: Direction, kind: EntryKind, body: &str) -> HistoryEntry {
        HistoryEntry {
            id,
            thread_id: "t-1".to_string(),
            direction,
            kind,
            channel: ChannelKind::MessagingApi,
            body: body.to_string(),
            subject: None,
            author: None,
            created_at: Utc::now(),
        }
    }

    fn item(name: &str) -> KnowledgeItem {
        KnowledgeItem {
            id: 1,
            name: name.to_string(),
            category: "plan".to_string(),
            price: 25.0,
            currency: "EUR".to_string(),
            description: "monthly subscription".to_string(),
        }
    }

    #[test]
    fn missing_attribution_renders_as_na_literals() {
        let thread = make_thread(Attribution {
            source: Some("facebook".to_string()),
            campaign: None,
            term: None,
            tags: vec![],
        });
        let prompt = build_prompt(&thread, &[], &[], &PromptOptions::default());

        assert!(prompt.contains("source: facebook\n"));
        assert!(prompt.contains("campaign: N/A\n"));
        assert!(prompt.contains("term: N/A\n"));
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let thread = make_thread(Attribution::default());
        let history = vec![
            entry(1, Direction::Inbound, EntryKind::Message, "hola, precio?"),
            entry(2, Direction::Outbound, EntryKind::Message, "25 EUR al mes"),
        ];
        let prompt = build_prompt(&thread, &[item("Plan Basico")], &history, &PromptOptions::default());

        let catalog = prompt.find("Product catalog:").unwrap();
        let attribution = prompt.find("Lead attribution:").unwrap();
        let conversation = prompt.find("Conversation:").unwrap();
        let target = prompt.find("Reply to this customer message:").unwrap();
        assert!(catalog < attribution);
        assert!(attribution < conversation);
        assert!(conversation < target);

        assert!(prompt.contains("- Plan Basico (plan): 25 EUR | monthly subscription\n"));
        assert!(prompt.contains("customer: hola, precio?\n"));
        assert!(prompt.contains("agent: 25 EUR al mes\n"));
        assert!(prompt.contains("Reply to this customer message: \"hola, precio?\"\n"));
    }

    #[test]
    fn empty_history_still_yields_valid_prompt() {
        let thread = make_thread(Attribution::default());
        let prompt = build_prompt(&thread, &[], &[], &PromptOptions::default());

        assert!(prompt.contains("Conversation:\n"));
        assert!(!prompt.contains("Reply to this customer message:"));
        assert!(prompt.contains("under 60 words"));
    }

    #[test]
    fn notes_are_excluded_from_conversation() {
        let thread = make_thread(Attribution::default());
        let history = vec![
            entry(1, Direction::Inbound, EntryKind::Message, "hola"),
            entry(2, Direction::Outbound, EntryKind::Note, "VIP customer, discount ok"),
        ];
        let prompt = build_prompt(&thread, &[], &history, &PromptOptions::default());

        assert!(!prompt.contains("VIP customer"));
        assert!(prompt.contains("customer: hola\n"));
    }

    #[test]
    fn history_window_keeps_most_recent_turns() {
        let thread = make_thread(Attribution::default());
        let history: Vec<HistoryEntry> = (0..30)
            .map(|i| entry(i, Direction::Inbound, EntryKind::Message, &format!("m{}", i)))
            .collect();
        let opts = PromptOptions {
            max_history_turns: 5,
            ..PromptOptions::default()
        };
        let prompt = build_prompt(&thread, &[], &history, &opts);

        assert!(!prompt.contains("customer: m24\n"));
        assert!(prompt.contains("customer: m25\n"));
        assert!(prompt.contains("customer: m29\n"));
    }
}
