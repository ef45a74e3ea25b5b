// tests/providers.rs
use chrono::{TimeZone, Utc};
use feature_forecast::config::ForecastConfig;
use feature_forecast::ingest::providers::{
    catalog, discussions, forum, github_issues, github_pulls, release_blog, social,
};
use feature_forecast::SourceKind;

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{name}")).expect("fixture")
}

fn levels(it: &feature_forecast::CandidateItem) -> (u8, u8) {
    (it.importance.get(), it.likelihood.get())
}

#[test]
fn issues_skip_prs_chores_and_quiet_threads() {
    let out = github_issues::parse_issues(&fixture("github_issues.json"), &[]).unwrap();
    assert_eq!(out.len(), 2);

    assert_eq!(out[0].title, "Add native support for Matter 1.4 energy reporting");
    assert_eq!(levels(&out[0]), (4, 4));
    assert_eq!(out[0].source, SourceKind::TrackerIssue);

    // entity decoded, core label bumps importance
    assert_eq!(out[1].title, "Dashboard: drag & drop sections on mobile");
    assert_eq!(levels(&out[1]), (3, 2));
}

#[test]
fn pulls_rate_breaking_changes_and_drafts() {
    let out = github_pulls::parse_pulls(&fixture("github_pulls.json"), &[]).unwrap();
    let titles: Vec<_> = out.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Add backup encryption key rotation",
            "Remove deprecated YAML config for legacy sensors"
        ]
    );
    assert_eq!(levels(&out[0]), (4, 4));
    assert_eq!(levels(&out[1]), (5, 3));
}

#[test]
fn blog_keeps_recent_posts_and_honours_denylist() {
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
    let xml = fixture("blog_rss.xml");

    let all = release_blog::parse_feed(&xml, now, &[]).unwrap();
    assert_eq!(all.len(), 3, "February post is past the cutoff");

    let cfg = ForecastConfig::default();
    let out = release_blog::parse_feed(&xml, now, &cfg.title_denylist).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].title, "Roadmap update - autumn edition");
    assert!(out.iter().all(|i| levels(i) == (4, 5)));
    assert_eq!(
        out[0].url.as_deref(),
        Some("https://www.home-assistant.io/blog/2026/10/07/release-202610/")
    );
}

#[test]
fn discussions_mark_adrs() {
    let out = discussions::parse_discussions(&fixture("discussions.json"), &[]).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(levels(&out[0]), (4, 3));
    assert_eq!(levels(&out[1]), (3, 3));
}

#[test]
fn forum_topics_link_back_to_site() {
    let out = forum::parse_topics(
        &fixture("forum_top.json"),
        "https://community.home-assistant.io/c/feature-requests/13/l/top.json?period=monthly",
        &[],
    )
    .unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(
        out[0].url.as_deref(),
        Some("https://community.home-assistant.io/t/native-zigbee-group-support-in-the-ui/4242")
    );
    assert_eq!(levels(&out[0]), (5, 1));
    assert_eq!(levels(&out[1]), (2, 1));
}

#[test]
fn reddit_skips_stickied_posts() {
    let out = social::parse_listing(&fixture("reddit.json"), &[]).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(levels(&out[0]), (4, 1));
    assert_eq!(
        out[1].url.as_deref(),
        Some("https://www.reddit.com/r/homeassistant/comments/a3/voice/")
    );
}

#[test]
fn catalog_drops_archived_and_rewards_activity() {
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
    let out = catalog::parse_search(&fixture("catalog.json"), now, &[]).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].source, SourceKind::Catalog);
    assert_eq!(levels(&out[0]), (5, 1));
    assert_eq!(out[1].title, "powercalc: Virtual power sensors");
    assert_eq!(levels(&out[1]), (3, 1));
}

#[test]
fn wrong_shape_is_an_error_not_a_panic() {
    assert!(social::parse_listing("[]", &[]).is_err());
    assert!(forum::parse_topics("{}", "https://f.test/x.json", &[]).is_err());
    assert!(release_blog::parse_feed("<html>", Utc::now(), &[]).is_err());
}
