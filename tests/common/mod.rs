//! Common test utilities and helpers

use async_trait::async_trait;
use spindle::grouped::ValueSequence;
use spindle::task::{Capability, Collector, Handler};

/// Splits each input line into words and emits `(word, "1")`
pub struct Tokenize;

#[async_trait]
impl Capability<String, String, String, String> for Tokenize {
    async fn invoke(
        &mut self,
        _doc: String,
        text: String,
        out: &mut Collector<'_, String, String>,
    ) -> anyhow::Result<()> {
        for word in text.split_whitespace() {
            out.emit(word.to_lowercase(), "1".to_string()).await?;
        }
        Ok(())
    }
}

/// Sums the counts of one word
pub struct SumCounts;

#[async_trait]
impl Capability<String, ValueSequence<String>, String, String> for SumCounts {
    async fn invoke(
        &mut self,
        word: String,
        mut counts: ValueSequence<String>,
        out: &mut Collector<'_, String, String>,
    ) -> anyhow::Result<()> {
        let mut total: u64 = 0;
        while let Some(count) = counts.next_value().await {
            total += count.parse::<u64>()?;
        }
        out.emit(word, total.to_string()).await?;
        Ok(())
    }
}

/// Word count handler with all three capabilities
pub fn word_count() -> Handler<String, String> {
    Handler::new("wordcount")
        .with_map(Tokenize)
        .with_combine(SumCounts)
        .with_reduce(SumCounts)
}

/// Sort tab-separated lines by key, as the shuffle between phases would
pub fn shuffle(output: &[u8]) -> Vec<u8> {
    let text = String::from_utf8(output.to_vec()).expect("utf-8 output");
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort_by_key(|line| line.split('\t').next().unwrap_or_default().to_string());
    let mut sorted = lines.join("\n");
    if !sorted.is_empty() {
        sorted.push('\n');
    }
    sorted.into_bytes()
}
