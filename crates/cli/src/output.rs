use address_protocol::{Candidate, CandidateSource};
use address_resolver::{ResolverSnapshot, ViewportRect};
use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Serialize)]
pub struct ClassifyOutput<'a> {
    pub text: &'a str,
    pub is_postcode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<String>,
}

pub fn print_json(value: &impl Serialize) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

pub fn render_candidates(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "No matching addresses.".to_string();
    }
    candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let source = match candidate.source() {
                CandidateSource::Postcode => "postcode",
                CandidateSource::Place => "place",
            };
            format!("[{idx}] {} ({source})", candidate.description())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_viewport(rect: &ViewportRect) -> String {
    format!(
        "top={} left={} width={} max_height={}",
        rect.top, rect.left, rect.width, rect.max_height
    )
}

pub fn print_snapshot(snapshot: &ResolverSnapshot, json: bool) -> Result<()> {
    if json {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer(&mut stdout, snapshot)?;
        writeln!(stdout)?;
        return Ok(());
    }

    let mut out = format!(
        "-- {:?} (generation {}) value={:?}",
        snapshot.phase, snapshot.generation, snapshot.value
    );
    if let Some(rect) = &snapshot.viewport {
        out.push_str(&format!("\n   panel {}", render_viewport(rect)));
    }
    for (idx, candidate) in snapshot.candidates.iter().enumerate() {
        let marker = if snapshot.highlighted == Some(idx) { '>' } else { ' ' };
        out.push_str(&format!("\n {marker} [{idx}] {}", candidate.description()));
    }
    println!("{out}");
    Ok(())
}
