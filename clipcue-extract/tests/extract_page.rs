use clipcue_extract::{extract, SiteProfile};
use url::Url;

/// A pruned detail-page snapshot: player chrome, sidebar, comment widgets,
/// and the title container buried a few levels deep.
const DETAIL_PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>滑板少年的一天 - 抖音</title>
</head>
<body>
  <div id="root">
    <header class="site-header"><a href="/">首页</a></header>
    <main>
      <div class="player-container">
        <video src="blob:placeholder"></video>
        <div class="xgplayer-controls"></div>
      </div>
      <div class="video-info-detail">
        <h1 class="title">
          滑板少年的一天 <span class="tag">#滑板</span>
        </h1>
        <p class="desc">记录一下周末的滑板日常</p>
        <div class="stats"><span>赞 12.3w</span><span>评论 8901</span></div>
      </div>
      <aside class="related-videos">
        <div class="video-meta-title">相关推荐标题（不应命中）</div>
      </aside>
    </main>
  </div>
</body>
</html>
"#;

#[test]
fn detail_page_title_wins_and_concatenates_descendant_text() {
    let location = Url::parse("https://www.douyin.com/video/7301112223334445556").unwrap();
    let info = extract(DETAIL_PAGE, &location, &SiteProfile::default()).unwrap();

    // textContent semantics: descendant text nodes concatenated, then trimmed.
    assert_eq!(info.title, "滑板少年的一天 #滑板");
    assert_eq!(info.url, location.as_str());
}

#[test]
fn feed_page_without_detail_container_uses_overlay_title() {
    let html = r#"
        <html><head><title>抖音 - 记录美好生活</title></head><body>
          <div class="xgplayer-video-title">街头钢琴即兴</div>
        </body></html>
    "#;
    let location = Url::parse("https://www.douyin.com/discover").unwrap();
    let info = extract(html, &location, &SiteProfile::default()).unwrap();
    assert_eq!(info.title, "街头钢琴即兴");
}

#[test]
fn stripped_page_falls_back_to_path_then_document_title() {
    let location = Url::parse("https://www.douyin.com/video/42?from=share").unwrap();
    let bare = "<html><head><title>别的标题 - 抖音</title></head><body></body></html>";
    // The path id outranks the document title.
    let info = extract(bare, &location, &SiteProfile::default()).unwrap();
    assert_eq!(info.title, "抖音视频 42");

    let no_id = Url::parse("https://www.douyin.com/user/self").unwrap();
    let info = extract(bare, &no_id, &SiteProfile::default()).unwrap();
    assert_eq!(info.title, "别的标题");
}

#[test]
fn custom_profile_replaces_selectors_and_constants() {
    let profile = SiteProfile {
        host: "example.video".to_string(),
        title_selectors: vec![".headline".to_string()],
        video_path_pattern: r"/watch/(\d+)".to_string(),
        synthetic_title_label: "视频".to_string(),
        title_suffix: " | Example".to_string(),
    };

    let location = Url::parse("https://example.video/watch/777").unwrap();
    let html = "<html><head><title>ignored | Example</title></head><body></body></html>";
    let info = extract(html, &location, &profile).unwrap();
    assert_eq!(info.title, "视频 777");

    let html = r#"<div class="headline">Hand-picked</div>"#;
    let info = extract(html, &location, &profile).unwrap();
    assert_eq!(info.title, "Hand-picked");
}
