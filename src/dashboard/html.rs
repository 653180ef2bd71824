//! Static HTML rendering of a result set.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::format::{
    format_integer, format_number, format_percent, format_percent_dp, format_time_ago,
    format_time_left, signal_label,
};
use super::view::{category_counts, ALL_LABEL, PAGE_SIZE};
use crate::analysis::{FilterConfig, Opportunity, ResultSet, Side, FAIR_PRICE};

const PAGE_TITLE: &str = "Scalping Strategy Dashboard";

const PAGE_STYLE: &str = "<style>:root{--bg:#0b0f17;--card:#141a26;--line:#2a3242;--ink:#e6e9ef;--muted:#8a93a6;--accent:#38bdf8;--yes:#60a5fa;--no:#f472b6}*{box-sizing:border-box}body{margin:0;background:var(--bg);color:var(--ink);font-family:\"Inter\",\"Segoe UI\",sans-serif}.shell{max-width:1150px;margin:0 auto;padding:32px 16px}header{text-align:center;margin-bottom:32px}h1{display:inline-block;margin:0 0 8px;padding-bottom:6px;border-bottom:2px solid var(--accent);font-size:2.2rem}.meta{color:var(--muted);line-height:1.6}.meta b{color:var(--ink)}.filter{display:flex;justify-content:center;gap:12px;align-items:center;margin-bottom:24px}select{background:var(--card);color:var(--ink);border:1px solid var(--line);border-radius:6px;padding:8px 12px}.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(420px,1fr));gap:20px}.card{background:var(--card);border:1px solid var(--line);border-radius:10px;padding:18px}.card[hidden]{display:none}.card-top{display:flex;justify-content:space-between;align-items:center;margin-bottom:12px}.badge{display:inline-block;font-size:.72rem;font-weight:700;padding:3px 8px;border-radius:4px;border:1px solid var(--line);margin-right:6px}.signal-strong-buy{color:#4ade80;border-color:#16a34a}.signal-buy{color:#60a5fa;border-color:#2563eb}.signal-sell{color:#fb923c;border-color:#ea580c}.signal-strong-sell{color:#f87171;border-color:#dc2626}.signal-neutral{color:var(--muted)}.age{font-size:.75rem;color:var(--muted)}.question{font-size:1.05rem;margin:0 0 14px}.prices{display:grid;grid-template-columns:1fr 1fr;gap:12px;margin-bottom:12px}.price{border:1px solid var(--line);border-radius:6px;padding:10px}.price.under{border-color:var(--accent)}.price .row{display:flex;justify-content:space-between}.yes{color:var(--yes);font-weight:700}.no{color:var(--no);font-weight:700}.sub{font-size:.75rem;color:var(--muted)}.stats{display:grid;grid-template-columns:repeat(3,1fr);gap:10px;font-size:.78rem;text-align:center;margin-bottom:12px}.stats div{border:1px solid var(--line);border-radius:6px;padding:6px}.tone-wide{color:#4ade80}.tone-mid{color:#eab308}.tone-tight{color:#fb923c}.ends{text-align:center;font-size:.78rem;color:var(--muted);margin-bottom:12px}.action{display:block;text-align:center;padding:9px;border:1px solid var(--accent);border-radius:6px;color:var(--ink);text-decoration:none;font-weight:600;font-size:.85rem}.empty{text-align:center;padding:80px 0;color:var(--muted)}.pager{display:flex;justify-content:center;gap:6px;margin:24px 0}.pager button{background:var(--card);color:var(--ink);border:1px solid var(--line);border-radius:4px;padding:6px 10px;cursor:pointer}.pager button.active{border-color:var(--accent);color:var(--accent)}.pager button:disabled{opacity:.4;cursor:default}footer{text-align:center;color:var(--muted);font-size:.8rem;border-top:1px solid var(--line);margin-top:48px;padding-top:24px}</style>\n";

const PAGE_SCRIPT: &str = r#"<script>
(function () {
  const PAGE_SIZE = __PAGE_SIZE__;
  const data = JSON.parse(document.getElementById("result-data").textContent);
  const cards = Array.from(document.querySelectorAll(".card"));
  const select = document.getElementById("category-filter");
  const pagers = Array.from(document.querySelectorAll(".pager"));
  let category = "All";
  let page = 1;

  const updated = document.getElementById("last-updated");
  if (updated && data.generatedAt) {
    updated.textContent = new Date(data.generatedAt).toLocaleString();
  }

  function matching() {
    return cards.filter(function (card, idx) {
      const opp = data.opportunities[idx];
      return category === "All" || (opp && opp.category === category);
    });
  }

  function pageNumbers(current, total) {
    const maxVisible = 5;
    let start = Math.max(1, current - Math.floor(maxVisible / 2));
    const end = Math.min(total, start + maxVisible - 1);
    if (end - start + 1 < maxVisible) start = Math.max(1, end - maxVisible + 1);
    const pages = [];
    for (let i = start; i <= end; i++) pages.push(i);
    if (start > 1) pages.unshift("...");
    if (end < total) pages.push("...");
    if (pages[0] !== 1) pages.unshift(1);
    if (pages[pages.length - 1] !== total) pages.push(total);
    return pages;
  }

  function button(label, target, disabled, active) {
    const b = document.createElement("button");
    b.textContent = label;
    b.disabled = disabled;
    if (active) b.className = "active";
    b.addEventListener("click", function () { render(target); });
    return b;
  }

  function render(target) {
    const visible = matching();
    const totalPages = Math.max(1, Math.ceil(visible.length / PAGE_SIZE));
    page = Math.max(1, Math.min(target, totalPages));
    const start = (page - 1) * PAGE_SIZE;
    cards.forEach(function (card) { card.hidden = true; });
    visible.slice(start, start + PAGE_SIZE).forEach(function (card) { card.hidden = false; });

    pagers.forEach(function (pager) {
      pager.innerHTML = "";
      if (totalPages <= 1) return;
      pager.appendChild(button("← Prev", page - 1, page === 1, false));
      pageNumbers(page, totalPages).forEach(function (p) {
        if (p === "...") {
          const gap = document.createElement("span");
          gap.textContent = "...";
          pager.appendChild(gap);
        } else {
          pager.appendChild(button(String(p), p, false, p === page));
        }
      });
      pager.appendChild(button("Next →", page + 1, page === totalPages, false));
    });
  }

  if (select) {
    select.addEventListener("change", function () {
      category = select.value;
      render(1);
    });
  }
  setTimeout(function () { window.location.reload(); }, 5 * 60 * 1000);
  render(1);
})();
</script>
"#;

/// Escape text for HTML element content and attribute values.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Serialize a value as JSON that cannot close an enclosing `<script>`.
pub fn script_safe_json<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

fn spread_tone(spread: Decimal) -> &'static str {
    if spread >= dec!(0.025) {
        "tone-wide"
    } else if spread >= dec!(0.02) {
        "tone-mid"
    } else {
        "tone-tight"
    }
}

fn signal_class(opp: &Opportunity) -> String {
    format!(
        "signal-{}",
        opp.signal.to_string().to_lowercase().replace('_', "-")
    )
}

fn threshold_summary(filters: &FilterConfig) -> String {
    format!(
        "Spread <b>{}-{}</b> · Vol &gt; <b>{}</b>",
        format_percent_dp(filters.min_spread, 1),
        format_percent_dp(filters.max_spread, 1),
        format_integer(filters.min_volume)
    )
}

fn render_header(out: &mut String, result: &ResultSet) {
    let generated = result
        .generated_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| result.generated_at.to_string());

    out.push_str("<header><h1>");
    out.push_str(PAGE_TITLE);
    out.push_str("</h1><p class=\"meta\">");
    out.push_str(&format!(
        "Top <b id=\"total-count\">{}</b> opportunities · {}",
        result.total_count,
        threshold_summary(&result.filters)
    ));
    out.push_str("<br>Last updated: <span id=\"last-updated\">");
    out.push_str(&escape_html(&generated));
    out.push_str("</span></p></header>\n");
}

fn render_category_filter(out: &mut String, opportunities: &[Opportunity]) {
    let counts = category_counts(opportunities);

    out.push_str("<div class=\"filter\"><label for=\"category-filter\">Filter by Category:</label>");
    out.push_str("<select id=\"category-filter\">");
    out.push_str(&format!(
        "<option value=\"{ALL_LABEL}\">All Categories ({})</option>",
        counts.all
    ));
    for (category, count) in &counts.by_category {
        let label = escape_html(&category.to_string());
        out.push_str(&format!("<option value=\"{label}\">{label} ({count})</option>"));
    }
    out.push_str("</select></div>\n");
}

fn render_price_box(out: &mut String, side: Side, price: Decimal, spread: Decimal) {
    let (label, class) = match side {
        Side::Yes => ("YES", "yes"),
        _ => ("NO", "no"),
    };
    let under = if price < FAIR_PRICE { " under" } else { "" };

    out.push_str(&format!(
        "<div class=\"price{under}\"><div class=\"row\"><span class=\"sub\">{label}</span><span class=\"{class}\">{}</span></div>",
        format_percent(price)
    ));
    out.push_str(&format!(
        "<div class=\"sub\">Spread: {}</div></div>",
        format_percent(spread)
    ));
}

fn render_card(out: &mut String, idx: usize, opp: &Opportunity, now: OffsetDateTime) {
    let market = &opp.market;
    let category = escape_html(&market.category.to_string());

    out.push_str(&format!(
        "<article class=\"card\" data-index=\"{idx}\" data-category=\"{category}\">"
    ));

    out.push_str("<div class=\"card-top\"><div>");
    out.push_str(&format!(
        "<span class=\"badge {}\">{}</span>",
        signal_class(opp),
        signal_label(opp.signal)
    ));
    out.push_str(&format!(
        "<span class=\"badge\">{}</span><span class=\"badge\">{category}</span>",
        opp.underpriced_side
    ));
    out.push_str("</div><span class=\"age\">");
    if let Some(updated_at) = market.updated_at {
        out.push_str(&format_time_ago(updated_at, now));
    }
    out.push_str("</span></div>");

    out.push_str("<h3 class=\"question\">");
    out.push_str(&escape_html(&market.question));
    out.push_str("</h3>");

    out.push_str("<div class=\"prices\">");
    render_price_box(out, Side::Yes, market.yes_price, opp.yes_spread);
    render_price_box(out, Side::No, market.no_price, opp.no_spread);
    out.push_str("</div>");

    out.push_str(&format!(
        "<div class=\"stats\"><div><div class=\"sub\">Spread</div><b class=\"{}\">{}</b></div><div><div class=\"sub\">Volume</div><b>{}</b></div><div><div class=\"sub\">Liquidity</div><b>{}</b></div></div>",
        spread_tone(opp.max_spread),
        format_percent_dp(opp.max_spread, 1),
        format_number(market.volume),
        format_number(market.liquidity)
    ));

    if market.time_left_ms > 0 {
        out.push_str(&format!(
            "<div class=\"ends\">Ends in: <b>{}</b></div>",
            format_time_left(market.time_left_ms)
        ));
    }

    out.push_str("<a class=\"action\" target=\"_blank\" rel=\"noopener noreferrer\" href=\"");
    out.push_str(&escape_html(&market.market_url));
    out.push_str(&format!(
        "\">{} at {} → Target +{}</a>",
        opp.underpriced_side,
        format_percent(opp.underpriced_price),
        format_percent_dp(opp.max_spread, 1)
    ));

    out.push_str("</article>\n");
}

/// Render the full dashboard page, using the current time for relative ages.
pub fn render_page(result: &ResultSet) -> Result<String, serde_json::Error> {
    render_page_at(result, OffsetDateTime::now_utc())
}

/// Render the full dashboard page with ages relative to `now`.
pub fn render_page_at(result: &ResultSet, now: OffsetDateTime) -> Result<String, serde_json::Error> {
    let embedded = script_safe_json(result)?;

    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>");
    out.push_str(PAGE_TITLE);
    out.push_str("</title>\n");
    out.push_str(PAGE_STYLE);
    out.push_str("</head><body><main class=\"shell\">\n");

    render_header(&mut out, result);
    render_category_filter(&mut out, &result.opportunities);

    out.push_str("<nav class=\"pager\"></nav>\n");
    if result.opportunities.is_empty() {
        out.push_str("<div class=\"empty\"><h3>No scalping opportunities right now</h3>");
        out.push_str("<p>Spreads are too tight or markets are balanced. Check back later.</p></div>\n");
    } else {
        out.push_str("<section class=\"grid\">\n");
        for (idx, opp) in result.opportunities.iter().enumerate() {
            render_card(&mut out, idx, opp, now);
        }
        out.push_str("</section>\n");
    }
    out.push_str("<nav class=\"pager\"></nav>\n");

    out.push_str("<footer><p>Data from Polymarket Gamma API · ");
    out.push_str(&threshold_summary(&result.filters));
    out.push_str("</p><p>Auto-refresh every 5 minutes</p></footer>\n");

    out.push_str("<script type=\"application/json\" id=\"result-data\">");
    out.push_str(&embedded);
    out.push_str("</script>\n");
    out.push_str(&PAGE_SCRIPT.replace("__PAGE_SIZE__", &PAGE_SIZE.to_string()));

    out.push_str("</main></body></html>\n");
    Ok(out)
}
