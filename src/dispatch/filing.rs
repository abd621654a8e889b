//! Secured-transaction filings
//!
//! A filing names debtors and secured parties. Every participant becomes a
//! node: organisations are Emitters keyed by their atomized name, individuals
//! are Receivers keyed by name and postal code. Every pair of distinct
//! participants in one filing is linked:
//! - RR between two debtors
//! - EE between two secured parties
//! - ER between a secured party and a debtor

use crate::graph::{edge_key, fill_gaps, EdgeDeclaration, EdgeKind, NodeDeclaration, NodeKind, PropertyMap};
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, Span};

use super::Dispatcher;

fn legal_suffix() -> &'static Regex {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    SUFFIX.get_or_init(|| {
        Regex::new(r",? +(inc|l\.?l\.?c|as representative|p\.c|co|as agent)\b\.?")
            .expect("Failed to compile legal suffix pattern")
    })
}

/// Reduce an organisation name to its identity key.
///
/// Lower-cases, strips legal suffixes, then removes spaces, dots and commas:
/// `"On Deck Capital, Inc."` becomes `"ondeckcapital"`.
pub fn atomize(name: &str) -> String {
    let lowered = name.to_lowercase();
    legal_suffix()
        .replace_all(&lowered, "")
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | ','))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IndividualName {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
}

impl fmt::Display for IndividualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.first_name, self.last_name)
    }
}

/// A filing participant, debtor or secured party
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Agent {
    pub organization_name: String,
    pub individual_name: IndividualName,
    pub mail_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Agent {
    pub fn organization(name: impl Into<String>) -> Self {
        Agent {
            organization_name: name.into(),
            ..Agent::default()
        }
    }

    pub fn individual(first: impl Into<String>, last: impl Into<String>, postal_code: impl Into<String>) -> Self {
        Agent {
            individual_name: IndividualName {
                first_name: first.into(),
                last_name: last.into(),
                ..IndividualName::default()
            },
            postal_code: postal_code.into(),
            ..Agent::default()
        }
    }

    /// Neither an organisation nor a named individual
    pub fn is_blank(&self) -> bool {
        self.organization_name.is_empty() && self.individual_name.last_name.is_empty()
    }
}

impl NodeDeclaration for Agent {
    fn identifier(&self) -> String {
        match self.kind() {
            NodeKind::Emitter => atomize(&self.organization_name),
            NodeKind::Receiver => format!("{}{}", self.individual_name, self.postal_code).to_lowercase(),
        }
    }

    fn kind(&self) -> NodeKind {
        if self.organization_name.is_empty() {
            NodeKind::Receiver
        } else {
            NodeKind::Emitter
        }
    }

    fn payload(&self) -> PropertyMap {
        let fields = [
            ("organization_name", &self.organization_name),
            ("first_name", &self.individual_name.first_name),
            ("middle_name", &self.individual_name.middle_name),
            ("last_name", &self.individual_name.last_name),
            ("mail_address", &self.mail_address),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        fields
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.to_string(), value.as_str().into()))
            .collect()
    }

    /// Known fields stay, missing ones are filled in
    fn merge(&self, old: &PropertyMap) -> PropertyMap {
        fill_gaps(old, &self.payload())
    }
}

/// One filing record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Filing {
    pub method: String,
    pub amendment_type: String,
    pub filing_type: String,
    pub original_file_number: u64,
    pub file_number: u64,
    pub original_file_date: String,
    pub file_date: String,
    pub debtors: Vec<Agent>,
    pub securers: Vec<Agent>,
}

impl Filing {
    /// Drop participants without an organisation or a last name
    pub fn clean(&mut self) {
        self.debtors.retain(|agent| !agent.is_blank());
        self.securers.retain(|agent| !agent.is_blank());
    }

    pub fn participant_count(&self) -> usize {
        self.debtors.len() + self.securers.len()
    }

    fn edge(&self, kind: EdgeKind, a: &str, b: &str) -> FilingEdge {
        let (source, target) = if b < a { (b, a) } else { (a, b) };
        FilingEdge {
            kind,
            source: source.to_string(),
            target: target.to_string(),
            record: self.original_file_number,
            payload: self.edge_payload(),
        }
    }

    fn edge_payload(&self) -> PropertyMap {
        let mut payload = PropertyMap::new();
        payload.insert("file_number".to_string(), self.file_number.into());
        payload.insert("original_file_number".to_string(), self.original_file_number.into());
        payload.insert("file_date".to_string(), self.file_date.as_str().into());
        payload.insert("original_file_date".to_string(), self.original_file_date.as_str().into());
        payload.insert("amendment_type".to_string(), self.amendment_type.as_str().into());
        payload.insert("filing_type".to_string(), self.filing_type.as_str().into());
        payload.insert("method".to_string(), self.method.as_str().into());
        payload
    }
}

/// Co-occurrence of two participants in one filing
#[derive(Debug, Clone, PartialEq)]
pub struct FilingEdge {
    pub kind: EdgeKind,
    pub source: String,
    pub target: String,
    pub record: u64,
    pub payload: PropertyMap,
}

impl EdgeDeclaration for FilingEdge {
    fn identifier(&self) -> String {
        edge_key(&self.source, &self.record.to_string(), &self.target)
    }

    fn kind(&self) -> EdgeKind {
        self.kind
    }

    fn source_id(&self) -> String {
        self.source.clone()
    }

    fn target_id(&self) -> String {
        self.target.clone()
    }

    fn payload(&self) -> PropertyMap {
        self.payload.clone()
    }
}

/// Keep the first agent of every identity; `seen` is shared across roles
fn distinct<'a>(
    agents: &'a [Agent],
    role: &str,
    seen: &mut FxHashSet<String>,
) -> Vec<(String, &'a Agent)> {
    let mut kept = Vec::with_capacity(agents.len());
    for agent in agents {
        let id = agent.identifier();
        if seen.insert(id.clone()) {
            kept.push((id, agent));
        } else {
            debug!(node = %id, role, "duplicate participant removed from record");
        }
    }
    kept
}

impl Dispatcher for Filing {
    type Node = Agent;
    type Edge = FilingEdge;

    fn dispatch(&self, span: &Span) -> (Vec<Agent>, Vec<FilingEdge>) {
        let _span = span.enter();
        let mut seen = FxHashSet::default();
        let debtors = distinct(&self.debtors, "debtor", &mut seen);
        let securers = distinct(&self.securers, "securer", &mut seen);

        let mut nodes = Vec::with_capacity(debtors.len() + securers.len());
        let mut edges = Vec::new();

        for (i, (id, agent)) in debtors.iter().enumerate() {
            nodes.push((*agent).clone());
            for (other, _) in &debtors[i + 1..] {
                edges.push(self.edge(EdgeKind::RR, id, other));
            }
        }
        for (i, (id, agent)) in securers.iter().enumerate() {
            nodes.push((*agent).clone());
            for (other, _) in &securers[i + 1..] {
                edges.push(self.edge(EdgeKind::EE, id, other));
            }
            for (debtor, _) in &debtors {
                edges.push(self.edge(EdgeKind::ER, id, debtor));
            }
        }

        debug!(
            record = self.original_file_number,
            nodes = nodes.len(),
            edges = edges.len(),
            "filing dispatched"
        );
        (nodes, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filing(debtors: Vec<Agent>, securers: Vec<Agent>) -> Filing {
        Filing {
            original_file_number: 42,
            file_number: 43,
            file_date: "2014-02-15".to_string(),
            debtors,
            securers,
            ..Filing::default()
        }
    }

    #[test]
    fn test_atomize() {
        assert_eq!(atomize("On Deck Capital, Inc."), "ondeckcapital");
        assert_eq!(atomize("ROCKWALL CAPITAL L.L.C."), "rockwallcapital");
        assert_eq!(atomize("CNH Capital   America LLC  "), "cnhcapitalamerica");
        assert_eq!(atomize("Smith & Jones, P.C."), "smith&jones");
        assert_eq!(atomize("Wells Fargo Bank, as agent"), "wellsfargobank");
        // "co" only as a whole word
        assert_eq!(atomize("Costco Wholesale Corp"), "costcowholesalecorp");
    }

    #[test]
    fn test_agent_identity() {
        let org = Agent::organization("Acme, Inc.");
        assert_eq!(org.kind(), NodeKind::Emitter);
        assert_eq!(org.identifier(), "acme");

        let person = Agent::individual("John", "Doe", "02139");
        assert_eq!(person.kind(), NodeKind::Receiver);
        assert_eq!(person.identifier(), "john.doe02139");
    }

    #[test]
    fn test_agent_payload_skips_empty_fields() {
        let mut agent = Agent::organization("Acme");
        agent.city = "Reno".to_string();
        let payload = agent.payload();

        assert_eq!(payload.len(), 2);
        assert_eq!(payload["city"].as_string(), Some("Reno"));
        assert!(!payload.contains_key("state"));
    }

    #[test]
    fn test_agent_merge_fills_gaps() {
        let mut first = Agent::organization("Acme");
        first.city = "Reno".to_string();
        let mut second = Agent::organization("Acme");
        second.city = "Elko".to_string();
        second.state = "NV".to_string();

        let merged = second.merge(&first.payload());
        assert_eq!(merged["city"].as_string(), Some("Reno"));
        assert_eq!(merged["state"].as_string(), Some("NV"));
    }

    #[test]
    fn test_clean_drops_blank_agents() {
        let mut record = filing(
            vec![Agent::default(), Agent::individual("Ann", "Lee", "1")],
            vec![Agent::organization("Bank")],
        );
        record.clean();
        assert_eq!(record.participant_count(), 2);
    }

    #[test]
    fn test_dispatch_edge_kinds_and_order() {
        let record = filing(
            vec![Agent::individual("Ann", "Lee", "1"), Agent::individual("Bo", "Ray", "2")],
            vec![Agent::organization("Bank A"), Agent::organization("Bank B")],
        );
        let (nodes, edges) = record.dispatch(&Span::none());

        assert_eq!(nodes.len(), 4);
        let kinds: Vec<EdgeKind> = edges.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EdgeKind::RR, EdgeKind::EE, EdgeKind::ER, EdgeKind::ER, EdgeKind::ER, EdgeKind::ER]
        );
        assert_eq!(edges[0].identifier(), "ann.lee1_42_bo.ray2");
        assert_eq!(edges[1].identifier(), "banka_42_bankb");
        assert_eq!(edges[0].payload["file_number"].as_integer(), Some(43));
    }

    #[test]
    fn test_dispatch_removes_duplicates_across_roles() {
        let record = filing(
            vec![Agent::organization("Acme Inc"), Agent::organization("ACME, Inc.")],
            vec![Agent::organization("acme"), Agent::individual("Ann", "Lee", "1")],
        );
        let (nodes, edges) = record.dispatch(&Span::none());

        assert_eq!(nodes.len(), 2);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::ER);
        assert_eq!(edges[0].source_id(), "acme");
        assert_eq!(edges[0].target_id(), "ann.lee1");
    }

    #[test]
    fn test_single_participant_dispatches_lone_node() {
        let record = filing(vec![Agent::individual("Dave", "Poe", "9")], vec![]);
        let (nodes, edges) = record.dispatch(&Span::none());
        assert_eq!(nodes.len(), 1);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_deserialize_filing() {
        let json = r#"{
            "OriginalFileNumber": 7,
            "FileNumber": 7,
            "Method": "Online",
            "Debtors": [{"IndividualName": {"FirstName": "Ann", "LastName": "Lee"}, "PostalCode": "02139"}],
            "Securers": [{"OrganizationName": "Bank, Inc."}]
        }"#;
        let record: Filing = serde_json::from_str(json).unwrap();
        assert_eq!(record.debtors[0].identifier(), "ann.lee02139");
        assert_eq!(record.securers[0].identifier(), "bank");
        assert_eq!(record.method, "Online");
    }
}
