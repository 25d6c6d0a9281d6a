//! Human-readable quote output. All display rounding happens here.

use fxquote_common::TrendChanges;
use fxquote_fx::Quote;
use std::fmt::Write;

/// Render a quote the way the converter card shows it.
pub fn render_quote(quote: &Quote) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:.2} {} = {:.2} {}",
        quote.amount, quote.from, quote.converted, quote.to
    );
    let _ = writeln!(
        out,
        "Rate: {:.6} • Updated {} • Source: {}",
        quote.rate,
        quote.as_of.format("%Y-%m-%d %H:%M:%S UTC"),
        quote.source
    );

    let pair = quote.pair();
    if !pair.is_identity() {
        let inverse = pair.inverse();
        let _ = writeln!(
            out,
            "Inverse: 1 {} = {:.6} {}",
            inverse.from,
            quote.inverse_rate(),
            inverse.to
        );
    }

    if let Some(changes) = &quote.changes {
        let _ = writeln!(out, "Trend: {}", render_changes(changes));
    }

    if let Some(history) = &quote.history {
        if let (Some(first), Some(last)) = (history.first(), history.last()) {
            let _ = writeln!(
                out,
                "History: {} points ({} .. {})",
                history.len(),
                first.date,
                last.date
            );
        }
    }

    out
}

fn render_changes(changes: &TrendChanges) -> String {
    format!(
        "1d {} | 7d {} | 30d {}",
        format_change(changes.d1),
        format_change(changes.d7),
        format_change(changes.d30)
    )
}

fn format_change(change: Option<f64>) -> String {
    match change {
        Some(pct) => format!("{:+.2}%", pct),
        None => "n/a".to_string(),
    }
}
