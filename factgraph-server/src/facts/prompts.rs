// Copyright 2025 Factgraph Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Prompt templates for the three fact-pipeline calls.
//!
//! Templates carry `{placeholder}` markers filled by plain string
//! substitution; the inputs are natural-language fact text, never code, so
//! no escaping is needed.

pub const EXTRACT_FACTS_PROMPT: &str = r#"Extract the atomic facts stated in the following text.

Rules:
- One fact per line, each a short standalone sentence.
- Split compound statements into separate facts.
- Keep the author's meaning; do not infer facts that are not stated.
- Output only the fact lines, with no numbering, bullets, or commentary.

Text:
<input>
{input}
</input>
"#;

pub const RECONCILE_FACTS_PROMPT: &str = r#"You are an AI assistant tasked with comparing two sets of facts: previous facts and new facts. Categorize facts as SUSTAINED, NEW, or CONFLICTS based on the following guidelines:

1) SUSTAINED: Facts from the previous set that are not contradicted, made obsolete, or significantly updated by new facts. This also includes duplicate information where the new fact is identical to an existing fact.
2) NEW: New facts that add information without directly conflicting with previous facts but may require user review for confirmation.
3) CONFLICTS: New facts that directly contradict, reverse, or significantly alter the meaning of previous facts. These should be flagged for user decision.

### Fact Classification Process:
- **Break Apart Facts**: Separate different aspects of a fact when possible to sustain non-conflicting parts and isolate the conflicting or new elements for further review.
- **User Review for New Information**: Present new facts that could either complement or clarify existing information but require user confirmation.
- **User Decision on Conflicts**: When a new fact directly contradicts a previously sustained fact, prompt the user to choose which fact should be sustained.

### Example Scenario:
- Previous fact: "Royal Caribbean International (RCI) was previously known as Royal Caribbean Cruise Line (RCCL)."
  - **Result**: "RCI was previously known as RCCL" is sustained.
- New fact: "Royal Caribbean International is only known as Royal Caribbean Cruise Line internationally."
  - **Result**: Flagged as NEW and presented for user review.
- Conflicting fact: "Royal Caribbean International is still known as Royal Caribbean Cruise Line."
  - **Result**: Flagged as CONFLICT, prompting the user to decide which understanding should be sustained.

Return ONLY a JSON object with the following structure:
{
  "sustained": [
    {"id": "s1", "fact": "Sustained fact text"}
  ],
  "new": [
    {"id": "n1", "fact": "New fact text"}
  ],
  "conflicts": [
    {
      "id": "c1",
      "newFact": "New conflicting fact",
      "oldFact": "Existing fact it conflicts with",
      "explanation": "Brief explanation of the conflict (max 5 words)",
      "userPrompt": "Ask the user to decide which fact should be sustained."
    }
  ]
}

Ensure:
- Every previous fact is either in "sustained" or has one or more corresponding "conflicts" entries.
- Every new fact is either in "new" or in "conflicts", but never in both.
- Duplicate facts should be categorized as "sustained."
- If any conflict related to a previous fact is accepted, that previous fact should be removed from "sustained."
- Do not include any text outside the JSON object.
- Use the exact keys and structure shown above.

Analyze the following sets of facts:

Previous facts:
<previous_facts>
{previousFacts}
</previous_facts>

New facts:
<new_facts>
{newFacts}
</new_facts>

Respond with the JSON object only.
"#;

pub const ORGANIZE_FACTS_PROMPT: &str = r#"Organize the following list of facts into a clean, canonical list.

Rules:
- Remove exact and near-duplicate facts, keeping one phrasing.
- Group related facts next to each other.
- Preserve the meaning of every input fact; do not drop or invent information.
- Output one fact per line, with no numbering, headings, or commentary.

Facts:
<facts>
{facts}
</facts>
"#;

pub fn extract_facts_prompt(input: &str) -> String {
    EXTRACT_FACTS_PROMPT.replace("{input}", input)
}

pub fn reconcile_facts_prompt(previous_facts: &str, new_facts: &str) -> String {
    RECONCILE_FACTS_PROMPT
        .replace("{previousFacts}", previous_facts)
        .replace("{newFacts}", new_facts)
}

pub fn organize_facts_prompt(facts: &str) -> String {
    ORGANIZE_FACTS_PROMPT.replace("{facts}", facts)
}
