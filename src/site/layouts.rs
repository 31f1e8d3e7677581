//! Maud layouts for the listing and per-proposal pages.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::lang::{Label, Lang, localized};
use crate::markdown::Filters;
use crate::proposals::Record;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// English-only detail fields and their section headings.
const ENGLISH_SECTIONS: &[(&str, Label)] = &[
    ("problem_en", Label::Problem),
    ("solution_en", Label::Solution),
    ("team_en", Label::Team),
];

/// Fallback body field when no localized `about_*` exists.
const STRUCTURED_ABOUT: &str = "about_structured_en";

pub struct PageContext<'a> {
    pub site_title: &'a str,
    pub lang: Lang,
    /// Relative path from the page back to the site root, e.g. `../../`.
    pub root: &'a str,
    /// Stylesheets relative to the site root.
    pub stylesheets: &'a [String],
}

/// A listing entry: the record plus the path of its page from the site root.
pub struct ListingEntry<'a> {
    pub record: &'a Record,
    pub href: String,
}

pub fn display_title<'a>(record: &'a Record, lang: Lang) -> &'a str {
    localized(record, "title", lang).unwrap_or(record.id())
}

fn document(ctx: &PageContext, title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(ctx.lang.as_str()) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="generator" content=(format!("catalyst-site v{VERSION}"));
                title {
                    @if title == ctx.site_title {
                        (title)
                    } @else {
                        (title) " | " (ctx.site_title)
                    }
                }
                @for sheet in ctx.stylesheets {
                    link rel="stylesheet" href=(format!("{}{sheet}", ctx.root));
                }
            }
            body {
                (body)
            }
        }
    }
}

/// Listing of every proposal, grouped under its challenge label.
pub fn index_page(ctx: &PageContext, groups: &[(&str, Vec<ListingEntry>)], total: usize) -> Markup {
    let body = html! {
        header class="site-header" {
            h1 { (ctx.site_title) }
            p class="count" { (ctx.lang.proposal_count(total)) }
        }
        main class="listing" {
            @for (label, entries) in groups {
                section class="challenge-group" {
                    h2 { (label) " " span class="count" { "(" (entries.len()) ")" } }
                    ul {
                        @for entry in entries {
                            li {
                                a href=(format!("{}{}", ctx.root, entry.href)) {
                                    (display_title(entry.record, ctx.lang))
                                }
                                " "
                                span class="proposal-id" { (entry.record.id()) }
                            }
                        }
                    }
                }
            }
        }
    };
    document(ctx, ctx.site_title, body)
}

/// Detail page for one merged proposal.
pub fn proposal_page(ctx: &PageContext, record: &Record, filters: &Filters) -> Markup {
    let title = display_title(record, ctx.lang);
    let summary = localized(record, "summary", ctx.lang)
        .map(|s| filters.md_sanitize.render(s))
        .unwrap_or_default();
    let about = localized(record, "about", ctx.lang)
        .or_else(|| record.get_str(STRUCTURED_ABOUT))
        .map(|s| filters.split_hr_sections(&filters.markdown.render(s)))
        .unwrap_or_default();

    let body = html! {
        nav class="breadcrumb" {
            a href=(format!("{}index.html", ctx.root)) { (ctx.site_title) }
        }
        main class="proposal" {
            header {
                h1 { (title) }
                p class="meta" {
                    span class="proposal-id" { (record.id()) }
                    @if let Some(challenge) = record.challenge() {
                        " "
                        span class="challenge" { (challenge) }
                    }
                }
            }
            @if !summary.is_empty() {
                div class="summary" { (PreEscaped(summary)) }
            }
            @for part in &about {
                section class="about-part" { (PreEscaped(part)) }
            }
            @for (field, heading) in ENGLISH_SECTIONS {
                @if record.get_str(field).is_some() {
                    section class="detail" {
                        h2 { (ctx.lang.label(*heading)) }
                        div lang="en" {
                            (PreEscaped(filters.md_sanitize.render_value(record.get(field))))
                        }
                    }
                }
            }
        }
    };
    document(ctx, title, body)
}
