//! Server-side rendering of the dashboard page: HTML for the controls and the
//! KPI cards, inline SVG for the charts.

use std::f64::consts::PI;
use std::fmt::Write;

use election_results::*;
use log::{debug, warn};

use crate::dashboard::colors::{PartyColors, DEFAULT_OTHER};
use crate::dashboard::{AppState, Mode, PageRequest, MAX_TOP_N, MIN_TOP_N};

/// The overview bar chart shows at most this many parties.
pub const OVERVIEW_MAX_PARTIES: usize = 15;

const FONT: &str = "Inter, Segoe UI, sans-serif";

const BAR_WIDTH: f64 = 960.0;
const BAR_HEIGHT: f64 = 520.0;
const BAR_MARGIN_LEFT: f64 = 96.0;
const BAR_MARGIN_RIGHT: f64 = 24.0;
const BAR_MARGIN_TOP: f64 = 64.0;
const BAR_MARGIN_BOTTOM: f64 = 170.0;

const PIE_WIDTH: f64 = 900.0;
const PIE_HEIGHT: f64 = 500.0;
const PIE_RADIUS: f64 = 190.0;
const PIE_HOLE: f64 = 0.45;
// Slices smaller than this fraction are only labelled in the legend.
const PIE_MIN_LABEL: f64 = 0.04;

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// 1234567 -> "1,234,567"
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_share(share: f64) -> String {
    format!("{:.1}%", share)
}

fn short_label(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut res: String = s.chars().take(max_chars - 1).collect();
        res.push('…');
        res
    }
}

/// Renders the whole page for the given state of the controls.
///
/// This is the only place where a request turns into numbers: it builds the
/// selection, runs the aggregation and draws the result.
pub fn render_dashboard(app: &AppState, req: &PageRequest) -> String {
    debug!("render_dashboard: {:?}", req);
    let mut body = String::new();
    body.push_str(&controls(app, req));

    match (req.mode, req.selection()) {
        (Mode::Overview, Some(selection)) => {
            body.push_str(&kpi_row(&app.summary));
            let view = aggregate(&app.dataset, &selection);
            if view.total() == 0 {
                let msg = if app.dataset.is_empty() {
                    "No results were loaded.".to_string()
                } else {
                    format!(
                        "No {} vote results were loaded.",
                        req.vote_type.title().to_lowercase()
                    )
                };
                body.push_str(&no_data(&msg));
            } else {
                let mut bars: Vec<(String, u64)> = view.tally().to_vec();
                bars.truncate(OVERVIEW_MAX_PARTIES);
                let title = format!("National Totals — {} Votes", req.vote_type.title());
                let y_label = format!("{} Votes", req.vote_type.title());
                body.push_str(&chart_card(&bar_chart_svg(
                    &title,
                    &y_label,
                    &bars,
                    &app.settings.colors,
                )));
            }
        }
        (Mode::State, Some(selection)) => {
            let view = aggregate(&app.dataset, &selection);
            if view.total() == 0 {
                warn!(
                    "render_dashboard: no data for {} votes in state {}",
                    selection.vote_type, selection.state
                );
                body.push_str(&no_data(&format!("No data for {}.", selection.state)));
            } else {
                let slices = top_n_with_others(&view, req.top_n);
                let title = format!(
                    "{} — {} Vote Share (%)",
                    selection.state,
                    req.vote_type.title()
                );
                body.push_str(&chart_card(&donut_chart_svg(
                    &title,
                    &slices,
                    &app.settings.colors,
                )));
            }
        }
        (_, None) => {
            body.push_str(&no_data("Pick a state."));
        }
    }

    page(&app.settings.title, &body)
}

fn page(title: &str, body: &str) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang='en'>");
    let _ = writeln!(html, "<head>");
    let _ = writeln!(html, "  <meta charset='utf-8'>");
    let _ = writeln!(
        html,
        "  <meta name='viewport' content='width=device-width, initial-scale=1'>"
    );
    let _ = writeln!(html, "  <title>{}</title>", escape_text(title));
    let _ = writeln!(html, "  <style>{}</style>", STYLE);
    let _ = writeln!(html, "</head>");
    let _ = writeln!(html, "<body>");
    let _ = writeln!(
        html,
        "  <nav class='navbar'><span class='brand'>{}</span></nav>",
        escape_text(title)
    );
    let _ = writeln!(html, "  <main>");
    html.push_str(body);
    let _ = writeln!(html, "  </main>");
    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");
    html
}

const STYLE: &str = "
body { margin: 0; background: #eef2f6; color: #212529; font-family: Inter, Segoe UI, sans-serif; }
.navbar { background: #2fa4e7; color: #fff; padding: 14px 24px; font-size: 1.25rem; font-weight: 700; box-shadow: 0 4px 12px rgba(0,0,0,0.15); }
main { padding: 24px; }
.controls { display: flex; flex-wrap: wrap; gap: 24px; background: #fff; border-radius: 16px; padding: 16px 24px; margin-bottom: 24px; box-shadow: 0 4px 12px rgba(0,0,0,0.08); }
fieldset { border: none; margin: 0; padding: 0; }
legend, .control-label { font-size: 0.8rem; font-weight: 700; text-transform: uppercase; color: #6c757d; margin-bottom: 6px; display: block; }
.controls label.pill { display: inline-block; margin-right: 8px; padding: 4px 14px; border: 1px solid #2fa4e7; border-radius: 999px; cursor: pointer; }
.controls select { padding: 4px 10px; border-radius: 999px; border: 1px solid #ced4da; }
.kpis { display: flex; flex-wrap: wrap; gap: 24px; margin-bottom: 24px; }
.kpi { flex: 1; min-width: 220px; background: #f8f9fa; border-radius: 16px; padding: 16px 20px; box-shadow: 0 2px 6px rgba(0,0,0,0.06); }
.kpi .title { font-size: 0.75rem; font-weight: 700; text-transform: uppercase; color: #6c757d; }
.kpi .value { font-size: 1.3rem; font-weight: 700; margin: 4px 0; }
.kpi .sub { font-size: 0.8rem; color: #6c757d; }
.chart { background: #fff; border-radius: 16px; padding: 16px; box-shadow: 0 4px 12px rgba(0,0,0,0.08); }
.chart svg { width: 100%; height: auto; }
.alert { background: #f8d7da; color: #842029; border-radius: 12px; padding: 16px 20px; }
";

fn radio(name: &str, value: &str, label: &str, checked: bool) -> String {
    format!(
        "<label class='pill'><input type='radio' name='{}' value='{}'{} onchange='this.form.submit()'> {}</label>",
        name,
        value,
        if checked { " checked" } else { "" },
        escape_text(label)
    )
}

fn controls(app: &AppState, req: &PageRequest) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<form class='controls' method='get' action='/'>");

    let _ = writeln!(html, "  <fieldset><legend>Dashboard Mode</legend>");
    let _ = writeln!(
        html,
        "    {}",
        radio("mode", Mode::Overview.as_str(), "Overview", req.mode == Mode::Overview)
    );
    let _ = writeln!(
        html,
        "    {}",
        radio("mode", Mode::State.as_str(), "States", req.mode == Mode::State)
    );
    let _ = writeln!(html, "  </fieldset>");

    let _ = writeln!(html, "  <fieldset><legend>Vote Type</legend>");
    for vt in [VoteType::Second, VoteType::First] {
        let label = format!("{} vote", vt.title());
        let _ = writeln!(
            html,
            "    {}",
            radio("vote_type", vt.as_str(), &label, req.vote_type == vt)
        );
    }
    let _ = writeln!(html, "  </fieldset>");

    match req.mode {
        Mode::State => {
            let _ = writeln!(
                html,
                "  <div><span class='control-label'>Select State</span><select name='state' onchange='this.form.submit()'>"
            );
            for s in app.dataset.states() {
                let selected = req.state.as_deref() == Some(s.as_str());
                let _ = writeln!(
                    html,
                    "    <option value='{}'{}>{}</option>",
                    escape_text(s),
                    if selected { " selected" } else { "" },
                    escape_text(s)
                );
            }
            let _ = writeln!(html, "  </select></div>");

            let _ = writeln!(
                html,
                "  <div><span class='control-label'>Top N Parties</span><select name='top_n' onchange='this.form.submit()'>"
            );
            for n in MIN_TOP_N..=MAX_TOP_N {
                let _ = writeln!(
                    html,
                    "    <option value='{}'{}>{}</option>",
                    n,
                    if n == req.top_n { " selected" } else { "" },
                    n
                );
            }
            let _ = writeln!(html, "  </select></div>");
        }
        Mode::Overview => {
            // Keep the state controls when going back and forth between the modes.
            if let Some(s) = &req.state {
                let _ = writeln!(
                    html,
                    "  <input type='hidden' name='state' value='{}'>",
                    escape_text(s)
                );
            }
            let _ = writeln!(
                html,
                "  <input type='hidden' name='top_n' value='{}'>",
                req.top_n
            );
        }
    }

    let _ = writeln!(
        html,
        "  <noscript><button type='submit'>Update</button></noscript>"
    );
    let _ = writeln!(html, "</form>");
    html
}

fn kpi_card(title: &str, value: &str, sub: &str) -> String {
    format!(
        "  <div class='kpi'><div class='title'>{}</div><div class='value'>{}</div><div class='sub'>{}</div></div>\n",
        escape_text(title),
        escape_text(value),
        escape_text(sub)
    )
}

fn kpi_row(summary: &NationalSummary) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<div class='kpis'>");
    for vt in [VoteType::Second, VoteType::First] {
        let title = format!("{} Vote Winner", vt.title());
        match summary.winner(vt) {
            Some(w) => html.push_str(&kpi_card(
                &title,
                &w.party,
                &format!("{} nationally", format_share(w.share)),
            )),
            None => html.push_str(&kpi_card(&title, "N/A", "")),
        }
    }
    html.push_str(&kpi_card(
        "States Covered",
        &summary.states_covered.to_string(),
        "",
    ));
    let _ = writeln!(html, "</div>");
    html
}

fn chart_card(svg: &str) -> String {
    format!("<div class='chart'>\n{}</div>\n", svg)
}

fn no_data(message: &str) -> String {
    format!(
        "<div class='alert' role='alert'>{}</div>\n",
        escape_text(message)
    )
}

/// A vertical bar chart of vote counts, one colored bar per party.
pub fn bar_chart_svg(
    title: &str,
    y_label: &str,
    bars: &[(String, u64)],
    colors: &PartyColors,
) -> String {
    let plot_w = BAR_WIDTH - BAR_MARGIN_LEFT - BAR_MARGIN_RIGHT;
    let plot_h = BAR_HEIGHT - BAR_MARGIN_TOP - BAR_MARGIN_BOTTOM;
    let baseline = BAR_MARGIN_TOP + plot_h;
    let max = bars.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1) as f64;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns='http://www.w3.org/2000/svg' width='{:.0}' height='{:.0}' viewBox='0 0 {:.0} {:.0}' role='img'>",
        BAR_WIDTH, BAR_HEIGHT, BAR_WIDTH, BAR_HEIGHT
    );
    let _ = writeln!(
        svg,
        "  <rect width='{:.0}' height='{:.0}' fill='#f8f9fa'/>",
        BAR_WIDTH, BAR_HEIGHT
    );
    let _ = writeln!(
        svg,
        "  <text x='{:.0}' y='36' fill='#212529' font-family='{}' font-size='20' font-weight='600'>{}</text>",
        BAR_MARGIN_LEFT,
        FONT,
        escape_text(title)
    );
    let _ = writeln!(
        svg,
        "  <rect x='{:.0}' y='{:.0}' width='{:.0}' height='{:.0}' fill='#ffffff'/>",
        BAR_MARGIN_LEFT, BAR_MARGIN_TOP, plot_w, plot_h
    );

    // Horizontal grid, 4 intervals.
    for i in 0..=4 {
        let value = max * i as f64 / 4.0;
        let y = baseline - plot_h * i as f64 / 4.0;
        let _ = writeln!(
            svg,
            "  <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='#e9ecef' stroke-width='1'/>",
            BAR_MARGIN_LEFT,
            y,
            BAR_MARGIN_LEFT + plot_w,
            y
        );
        let _ = writeln!(
            svg,
            "  <text x='{:.1}' y='{:.1}' text-anchor='end' fill='#6c757d' font-family='{}' font-size='12'>{}</text>",
            BAR_MARGIN_LEFT - 8.0,
            y + 4.0,
            FONT,
            format_count(value.round() as u64)
        );
    }
    let _ = writeln!(
        svg,
        "  <text transform='translate(18 {:.1}) rotate(-90)' text-anchor='middle' fill='#495057' font-family='{}' font-size='14'>{}</text>",
        BAR_MARGIN_TOP + plot_h / 2.0,
        FONT,
        escape_text(y_label)
    );

    let slot = plot_w / bars.len().max(1) as f64;
    let bar_w = slot * 0.7;
    for (idx, (party, votes)) in bars.iter().enumerate() {
        let h = *votes as f64 / max * plot_h;
        let x = BAR_MARGIN_LEFT + slot * idx as f64 + (slot - bar_w) / 2.0;
        let _ = writeln!(
            svg,
            "  <rect x='{:.1}' y='{:.1}' width='{:.1}' height='{:.1}' fill='{}'><title>{}: {}</title></rect>",
            x,
            baseline - h,
            bar_w,
            h,
            escape_text(colors.color(party)),
            escape_text(party),
            format_count(*votes)
        );
        let _ = writeln!(
            svg,
            "  <text transform='translate({:.1} {:.1}) rotate(-35)' text-anchor='end' fill='#212529' font-family='{}' font-size='12'>{}</text>",
            x + bar_w / 2.0,
            baseline + 14.0,
            FONT,
            escape_text(&short_label(party, 28))
        );
    }
    let _ = writeln!(svg, "</svg>");
    svg
}

fn polar(radius: f64, angle: f64, cx: f64, cy: f64) -> (f64, f64) {
    (cx + radius * angle.cos(), cy + radius * angle.sin())
}

/// A donut chart of vote shares with a legend on the right.
pub fn donut_chart_svg(title: &str, slices: &[PartyShare], colors: &PartyColors) -> String {
    let cx = 40.0 + PIE_RADIUS;
    let cy = 70.0 + PIE_RADIUS;
    let inner = PIE_RADIUS * PIE_HOLE;
    let total: f64 = slices.iter().map(|ps| ps.share).sum();

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns='http://www.w3.org/2000/svg' width='{:.0}' height='{:.0}' viewBox='0 0 {:.0} {:.0}' role='img'>",
        PIE_WIDTH, PIE_HEIGHT, PIE_WIDTH, PIE_HEIGHT
    );
    let _ = writeln!(
        svg,
        "  <rect width='{:.0}' height='{:.0}' fill='#f8f9fa'/>",
        PIE_WIDTH, PIE_HEIGHT
    );
    let _ = writeln!(
        svg,
        "  <text x='24' y='36' fill='#212529' font-family='{}' font-size='20' font-weight='600'>{}</text>",
        FONT,
        escape_text(title)
    );

    let mut start = -PI / 2.0;
    for ps in slices.iter() {
        let frac = if total > 0.0 { ps.share / total } else { 0.0 };
        if frac <= 0.0 {
            continue;
        }
        let color = escape_text(slice_color(&ps.party, colors));
        let end = start + 2.0 * PI * frac;
        if frac >= 0.9999 {
            // A single arc cannot draw a full circle.
            let _ = writeln!(
                svg,
                "  <circle cx='{:.2}' cy='{:.2}' r='{:.2}' fill='none' stroke='{}' stroke-width='{:.2}'><title>{}: {}</title></circle>",
                cx,
                cy,
                (PIE_RADIUS + inner) / 2.0,
                color,
                PIE_RADIUS - inner,
                escape_text(&ps.party),
                format_share(ps.share)
            );
        } else {
            let large = if end - start > PI { 1 } else { 0 };
            let (ox0, oy0) = polar(PIE_RADIUS, start, cx, cy);
            let (ox1, oy1) = polar(PIE_RADIUS, end, cx, cy);
            let (ix1, iy1) = polar(inner, end, cx, cy);
            let (ix0, iy0) = polar(inner, start, cx, cy);
            let _ = writeln!(
                svg,
                "  <path d='M {:.2} {:.2} A {:.2} {:.2} 0 {} 1 {:.2} {:.2} L {:.2} {:.2} A {:.2} {:.2} 0 {} 0 {:.2} {:.2} Z' fill='{}' stroke='#000' stroke-width='1'><title>{}: {}</title></path>",
                ox0, oy0, PIE_RADIUS, PIE_RADIUS, large, ox1, oy1,
                ix1, iy1, inner, inner, large, ix0, iy0,
                color,
                escape_text(&ps.party),
                format_share(ps.share)
            );
        }
        if frac >= PIE_MIN_LABEL {
            let (lx, ly) = polar((PIE_RADIUS + inner) / 2.0, (start + end) / 2.0, cx, cy);
            let _ = writeln!(
                svg,
                "  <text x='{:.2}' y='{:.2}' text-anchor='middle' fill='#ffffff' stroke='#000' stroke-width='0.4' font-family='{}' font-size='13' font-weight='600'>{}</text>",
                lx,
                ly + 4.0,
                FONT,
                format_share(ps.share)
            );
        }
        start = end;
    }

    // Legend
    let legend_x = cx + PIE_RADIUS + 60.0;
    for (idx, ps) in slices.iter().enumerate() {
        let y = 90.0 + 30.0 * idx as f64;
        let _ = writeln!(
            svg,
            "  <rect x='{:.0}' y='{:.0}' width='16' height='16' rx='3' fill='{}' stroke='#000' stroke-width='0.5'/>",
            legend_x,
            y,
            escape_text(slice_color(&ps.party, colors))
        );
        let _ = writeln!(
            svg,
            "  <text x='{:.0}' y='{:.0}' fill='#212529' font-family='{}' font-size='14'>{} · {}</text>",
            legend_x + 26.0,
            y + 13.0,
            FONT,
            escape_text(&short_label(&ps.party, 40)),
            format_share(ps.share)
        );
    }
    let _ = writeln!(svg, "</svg>");
    svg
}

fn slice_color<'a>(party: &str, colors: &'a PartyColors) -> &'a str {
    if party == OTHERS {
        DEFAULT_OTHER
    } else {
        colors.color(party)
    }
}
