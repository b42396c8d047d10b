use crate::FixesConfig;
use crate::Handler;
use crate::Outcome;
use crate::Page;
use crate::PageLocation;
use crate::ReadyState;
use crate::Routine;
use crate::carousel::CarouselState;
use crate::property_filter::FacetKind;
use crate::property_filter::FacetSelection;
use crate::property_filter::TileFacets;
use crate::property_filter::tile_visible;
use proptest::collection::vec;
use proptest::prelude::*;
use sf_core::FixError;
use sf_core::FixResult;
use sf_dom::Document;
use sf_dom::EventKind;
use sf_dom::NodeId;

fn location(path: &str) -> PageLocation {
    PageLocation::parse(path).unwrap_or_else(|_| unreachable!())
}

fn booted(html: &str, path: &str) -> Page {
    booted_with(html, path, FixesConfig::default())
}

fn booted_with(html: &str, path: &str, config: FixesConfig) -> Page {
    let mut page = Page::from_html(html, location(path), config);
    page.boot();
    page
}

fn first(page: &Page, selector: &str) -> NodeId {
    page.query(selector)
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| panic!("nothing matches {selector}"))
}

fn all(page: &Page, selector: &str) -> Vec<NodeId> {
    page.query_all(selector).unwrap_or_else(|_| unreachable!())
}

fn shown(page: &Page, selector: &str) -> bool {
    page.document().is_displayed(first(page, selector))
}

fn click(page: &mut Page, selector: &str) {
    let target = first(page, selector);
    page.click(target).unwrap_or_else(|_| unreachable!());
}

fn check(page: &mut Page, selector: &str, checked: bool) {
    let target = first(page, selector);
    page.check(target, checked).unwrap_or_else(|_| unreachable!());
}

// ---- carousel -------------------------------------------------------------

const CAROUSEL_HTML: &str = r#"<section class="hero">
  <div class="flickity-viewport">
    <div class="flickity-slider">
      <div class="slide">One</div>
      <div class="slide">Two</div>
      <div class="slide">Three</div>
    </div>
  </div>
  <div class="flickity-viewport"><div class="flickity-slider"><div>Only</div></div></div>
  <div class="flickity-viewport"></div>
</section>"#;

fn visible_slides(page: &Page) -> Vec<usize> {
    page.carousels()[0]
        .slides()
        .iter()
        .enumerate()
        .filter(|(_, slide)| page.document().is_displayed(**slide))
        .map(|(index, _)| index)
        .collect()
}

fn active_dots(page: &Page) -> Vec<usize> {
    page.carousels()[0]
        .dots()
        .iter()
        .enumerate()
        .filter(|(_, dot)| page.document().has_class(**dot, "active"))
        .map(|(index, _)| index)
        .collect()
}

#[test]
fn carousel_gets_wrapper_buttons_and_dots() {
    let page = booted(CAROUSEL_HTML, "/");
    assert_eq!(page.carousels().len(), 1);
    let doc = page.document();
    let carousel = &page.carousels()[0];

    let wrap = carousel.wrap();
    assert_eq!(doc.attr(wrap, "class"), Some("sf-carousel-wrap"));
    assert_eq!(
        doc.children(wrap),
        &[carousel.viewport(), carousel.prev_button(), carousel.next_button()]
    );
    assert_eq!(doc.attr(carousel.prev_button(), "aria-label"), Some("Previous slide"));
    assert_eq!(doc.text_content(carousel.next_button()), "\u{203a}");

    let dots_bar = doc.next_sibling(wrap).unwrap_or_else(|| unreachable!());
    assert!(doc.has_class(dots_bar, "sf-carousel-dots"));
    assert_eq!(doc.children(dots_bar), carousel.dots());
    assert_eq!(doc.attr(carousel.dots()[2], "aria-label"), Some("Go to slide 3"));

    assert_eq!(visible_slides(&page), vec![0]);
    assert_eq!(active_dots(&page), vec![0]);
    assert_eq!(all(&page, ".sf-carousel-wrap").len(), 1);
}

#[test]
fn prev_next_and_dots_move_the_slide() {
    let mut page = booted(CAROUSEL_HTML, "/");

    click(&mut page, ".sf-carousel-next");
    assert_eq!(visible_slides(&page), vec![1]);
    assert_eq!(active_dots(&page), vec![1]);

    click(&mut page, ".sf-carousel-prev");
    click(&mut page, ".sf-carousel-prev");
    assert_eq!(visible_slides(&page), vec![2]);
    assert_eq!(page.carousels()[0].state().current(), 2);

    let dot = page.carousels()[0].dots()[1];
    page.click(dot).unwrap_or_else(|_| unreachable!());
    assert_eq!(visible_slides(&page), vec![1]);
    assert_eq!(active_dots(&page), vec![1]);
}

#[test]
fn swipes_past_the_threshold_change_slides() {
    let mut page = booted(CAROUSEL_HTML, "/");
    let slide = first(&page, ".slide");

    // Touches on a slide bubble up to the viewport.
    page.swipe(slide, -41.0).unwrap_or_else(|_| unreachable!());
    assert_eq!(visible_slides(&page), vec![1]);

    page.swipe(slide, -39.0).unwrap_or_else(|_| unreachable!());
    assert_eq!(visible_slides(&page), vec![1]);

    page.swipe(slide, 41.0).unwrap_or_else(|_| unreachable!());
    assert_eq!(visible_slides(&page), vec![0]);

    let viewport = page.carousels()[0].viewport();
    page.touch_end(viewport, -500.0).unwrap_or_else(|_| unreachable!());
    assert_eq!(visible_slides(&page), vec![0]);
}

#[test]
fn disabled_carousel_leaves_markup_alone() {
    let mut config = FixesConfig::default();
    config.carousel.enabled = false;
    let page = booted_with(CAROUSEL_HTML, "/", config);

    let report = page.report().unwrap_or_else(|| unreachable!());
    assert_eq!(report.outcome(Routine::Carousel), Some(&Outcome::Disabled));
    assert!(all(&page, ".sf-carousel-wrap").is_empty());
    assert!(page.carousels().is_empty());
}

#[test]
fn configured_swipe_threshold_applies() {
    let mut config = FixesConfig::default();
    config.carousel.swipe_threshold = 100.0;
    let mut page = booted_with(CAROUSEL_HTML, "/", config);
    let viewport = page.carousels()[0].viewport();

    page.swipe(viewport, -60.0).unwrap_or_else(|_| unreachable!());
    assert_eq!(visible_slides(&page), vec![0]);
    page.swipe(viewport, -100.0).unwrap_or_else(|_| unreachable!());
    assert_eq!(visible_slides(&page), vec![0]);
    page.swipe(viewport, -101.0).unwrap_or_else(|_| unreachable!());
    assert_eq!(visible_slides(&page), vec![1]);
}

fn carousel_html(count: usize) -> String {
    let slides: String = (0..count)
        .map(|index| format!("<div class=\"slide\">{index}</div>"))
        .collect();
    format!("<div class=\"flickity-viewport\"><div class=\"flickity-slider\">{slides}</div></div>")
}

proptest! {
    #[test]
    fn show_always_lands_in_range(count in 1_usize..64, n in any::<i64>()) {
        let mut state = CarouselState::new(count).unwrap_or_else(|| unreachable!());
        let index = state.show(n);
        prop_assert!(index < count);
        prop_assert_eq!(i128::from(n).rem_euclid(count as i128), index as i128);
    }

    #[test]
    fn exactly_one_slide_is_visible_after_any_clicks(
        (count, actions) in (2_usize..7).prop_flat_map(|count| (Just(count), vec(0..count + 2, 0..16)))
    ) {
        let mut page = booted(&carousel_html(count), "/");
        let mut expected = 0_usize;
        for action in actions {
            let carousel = &page.carousels()[0];
            let (target, next) = if action < count {
                (carousel.dots()[action], action)
            } else if action == count {
                (carousel.prev_button(), (expected + count - 1) % count)
            } else {
                (carousel.next_button(), (expected + 1) % count)
            };
            page.click(target).unwrap_or_else(|_| unreachable!());
            expected = next;

            prop_assert_eq!(visible_slides(&page), vec![expected]);
            prop_assert_eq!(active_dots(&page), vec![expected]);
        }
    }
}

// ---- property filter ------------------------------------------------------

const PROPERTY_HTML: &str = r#"<div class="filters">
  <div class="filter-items" id="types">
    <label><input type="checkbox" value="All"> All</label>
    <label><input type="checkbox" value="Retail"> Retail</label>
    <label><input type="checkbox" value="Office"> Office</label>
  </div>
  <div class="filter-items" id="states">
    <input type="checkbox" value="All">
    <input type="checkbox" value="NSW">
    <input type="checkbox" value="VIC">
  </div>
</div>
<div class="row">
  <div class="col-md-4" id="c1"><div class="tile-range" id="t1"><p class="address">Retail | Sydney, NSW</p></div></div>
  <div class="col-md-4" id="c2"><div class="tile-range" id="t2"><p class="address">Office | Melbourne, VIC</p></div></div>
  <div class="col-md-4" id="c3"><div class="tile-range" id="t3"><p class="address">Retail | Geelong, VIC</p></div></div>
  <div class="tile-range" id="t4"><p>Coming soon</p></div>
</div>"#;

#[test]
fn tiles_are_stamped_from_their_address() {
    let page = booted(PROPERTY_HTML, "/Properties");
    let doc = page.document();
    let t1 = first(&page, "#t1");
    assert_eq!(doc.attr(t1, "data-sf-type"), Some("Retail"));
    assert_eq!(doc.attr(t1, "data-sf-state"), Some("NSW"));
    let t4 = first(&page, "#t4");
    assert_eq!(doc.attr(t4, "data-sf-type"), None);

    let filter = page.property_filter().unwrap_or_else(|| unreachable!());
    assert_eq!(filter.container(FacetKind::Type), Some(first(&page, "#types")));
    assert_eq!(filter.container(FacetKind::State), Some(first(&page, "#states")));
    assert!(page.diagnostics().is_empty());
}

#[test]
fn nothing_checked_shows_every_tile() {
    let mut page = booted(PROPERTY_HTML, "/Properties");
    check(&mut page, "#types input[value=\"Retail\"]", true);
    assert!(!shown(&page, "#c2"));

    check(&mut page, "#types input[value=\"Retail\"]", false);
    for column in ["#c1", "#c2", "#c3", "#t4"] {
        assert!(shown(&page, column), "{column} hidden");
    }
}

#[test]
fn both_dimensions_must_match() {
    let mut page = booted(PROPERTY_HTML, "/Properties");
    check(&mut page, "#types input[value=\"Retail\"]", true);
    assert!(shown(&page, "#c1"));
    assert!(!shown(&page, "#c2"));
    assert!(shown(&page, "#c3"));
    // No address, so no type: hidden whenever types are constrained.
    assert!(!shown(&page, "#t4"));

    check(&mut page, "#states input[value=\"VIC\"]", true);
    assert!(!shown(&page, "#c1"));
    assert!(!shown(&page, "#c2"));
    assert!(shown(&page, "#c3"));

    // Visibility goes on the column; the tile itself is untouched.
    let t1 = first(&page, "#t1");
    assert!(page.document().is_displayed(t1));
    assert!(page.document().is_connected(t1));
}

#[test]
fn checking_all_clears_its_siblings_and_vice_versa() {
    let mut page = booted(PROPERTY_HTML, "/Properties");
    let retail = first(&page, "#types input[value=\"Retail\"]");
    let office = first(&page, "#types input[value=\"Office\"]");
    let all_types = first(&page, "#types input[value=\"All\"]");
    let vic = first(&page, "#states input[value=\"VIC\"]");

    page.check(retail, true).unwrap_or_else(|_| unreachable!());
    page.check(office, true).unwrap_or_else(|_| unreachable!());
    page.check(vic, true).unwrap_or_else(|_| unreachable!());
    page.check(all_types, true).unwrap_or_else(|_| unreachable!());

    let doc = page.document();
    assert!(doc.is_checked(all_types));
    assert!(!doc.is_checked(retail));
    assert!(!doc.is_checked(office));
    assert!(doc.is_checked(vic), "other containers keep their state");
    assert!(shown(&page, "#c2") && shown(&page, "#c3"));
    assert!(!shown(&page, "#c1"));

    page.check(office, true).unwrap_or_else(|_| unreachable!());
    assert!(!page.document().is_checked(all_types));
    assert!(shown(&page, "#c2"));
    assert!(!shown(&page, "#c3"));
}

#[test]
fn unclassifiable_and_duplicate_containers_are_reported() {
    let html = r#"
      <div class="filter-items" id="a"><input type="checkbox" value="Retail"></div>
      <div class="filter-items" id="b"><input type="checkbox" value="Hotel"></div>
      <div class="filter-items" id="c"><input type="checkbox" value="Under 10m"></div>
      <div class="filter-items" id="d" data-sf-facet="state"><input type="checkbox" value="Queensland"></div>
      <div class="tile-range"><p class="address">Hotel | Brisbane, QLD</p></div>"#;
    let page = booted(html, "/Properties");

    let filter = page.property_filter().unwrap_or_else(|| unreachable!());
    assert_eq!(filter.container(FacetKind::Type), Some(first(&page, "#a")));
    assert_eq!(filter.container(FacetKind::State), Some(first(&page, "#d")));

    let flagged: Vec<_> = page.diagnostics().iter().map(|d| d.node).collect();
    assert_eq!(flagged, vec![Some(first(&page, "#b")), Some(first(&page, "#c"))]);
    assert!(page.diagnostics().iter().all(|d| d.routine == Routine::PropertyFilter));
}

#[test]
fn container_in_both_vocabularies_is_reported() {
    let html = r#"
      <div class="filter-items" id="mixed"><input type="checkbox" value="Retail"><input type="checkbox" value="NSW"></div>
      <div class="tile-range"><p class="address">Retail | Sydney, NSW</p></div>"#;
    let page = booted(html, "/Properties");

    let mixed = first(&page, "#mixed");
    let filter = page.property_filter().unwrap_or_else(|| unreachable!());
    assert_eq!(filter.container(FacetKind::Type), Some(mixed));
    assert_eq!(filter.container(FacetKind::State), None);

    assert_eq!(page.diagnostics().len(), 1);
    let diagnostic = &page.diagnostics()[0];
    assert_eq!(diagnostic.node, Some(mixed));
    assert!(diagnostic.message.contains("both type and state"));
}

#[test]
fn unclassified_containers_leave_every_tile_visible() {
    let html = r#"
      <div class="filter-items" id="price"><input type="checkbox" value="Under 10m"><input type="checkbox" value="Over 10m"></div>
      <div class="row">
        <div class="col-md-6" id="p1"><div class="tile-range"><p class="address">Retail | Sydney, NSW</p></div></div>
        <div class="col-md-6" id="p2"><div class="tile-range"><p class="address">Office | Melbourne, VIC</p></div></div>
      </div>"#;
    let mut page = booted(html, "/Properties");

    let filter = page.property_filter().unwrap_or_else(|| unreachable!());
    assert_eq!(filter.container(FacetKind::Type), None);
    assert_eq!(filter.container(FacetKind::State), None);
    assert_eq!(page.diagnostics().len(), 1);

    check(&mut page, "#price input[value=\"Under 10m\"]", true);
    assert!(shown(&page, "#p1") && shown(&page, "#p2"));
}

#[test]
fn property_filter_needs_tiles_and_containers() {
    let page = booted(r#"<div class="tile-range"><p class="address">Retail | A, NSW</p></div>"#, "/");
    let report = page.report().unwrap_or_else(|| unreachable!());
    assert!(matches!(report.outcome(Routine::PropertyFilter), Some(Outcome::Skipped(_))));
    let tile = first(&page, ".tile-range");
    assert!(!page.document().has_attr(tile, "data-sf-type"));
}

proptest! {
    #[test]
    fn unconstrained_dimensions_admit_any_tile(
        property_type in "[A-Za-z]{0,8}",
        state in "[A-Z]{0,3}",
        others in vec("[A-Za-z]{1,8}", 0..4),
    ) {
        let tile = TileFacets { property_type: property_type.clone(), state: state.clone() };
        let mut with_all = others.clone();
        with_all.push("All".to_owned());

        prop_assert!(tile_visible(&tile, &FacetSelection::default(), &FacetSelection::default()));
        prop_assert!(tile_visible(&tile, &FacetSelection::new(with_all.clone()), &FacetSelection::new(with_all)));

        let mut exact = others;
        exact.push(property_type);
        prop_assert!(tile_visible(&tile, &FacetSelection::new(exact), &FacetSelection::new([state])));
    }
}

// ---- news filter ----------------------------------------------------------

const NEWS_HTML: &str = r#"<div class="container">
  <h1>News</h1>
  <div class="row" id="row1">
    <div class="col-sm-6" id="n1"><div class="tile-range"><span class="tags">Media</span><h3>Opening</h3></div></div>
    <div class="col-sm-6" id="n2"><div class="tile-range"><span class="tags"> ESG </span></div></div>
  </div>
  <div class="row" id="row2">
    <div class="col-sm-6" id="n3"><div class="tile-range"><span class="tags">Media</span></div></div>
    <div class="col-sm-6" id="n4"><div class="tile-range"><span class="tags"></span></div></div>
  </div>
</div>"#;

#[test]
fn news_bar_lands_before_the_first_tile_row() {
    let page = booted(NEWS_HTML, "/News");
    let doc = page.document();
    let news = page.news_filter().unwrap_or_else(|| unreachable!());

    assert_eq!(doc.next_sibling(news.bar()), Some(first(&page, "#row1")));
    assert_eq!(doc.attr(news.bar(), "class"), Some("sf-news-filter container"));
    let labels: Vec<_> = news.buttons().iter().map(|b| doc.text_content(*b)).collect();
    assert_eq!(labels, vec!["All", "Media", "ESG"]);
    assert!(doc.has_class(news.buttons()[0], "active"));
    assert!(!doc.has_class(news.buttons()[1], "active"));
}

#[test]
fn category_buttons_filter_tiles() {
    let mut page = booted(NEWS_HTML, "/News");
    let media = {
        let news = page.news_filter().unwrap_or_else(|| unreachable!());
        news.button_for(page.document(), "Media").unwrap_or_else(|| unreachable!())
    };
    // Click the label text; the bar resolves the button from the target.
    let label = page.document().children(media)[0];
    page.click(label).unwrap_or_else(|_| unreachable!());

    assert!(shown(&page, "#n1") && shown(&page, "#n3"));
    assert!(!shown(&page, "#n2") && !shown(&page, "#n4"));
    let news = page.news_filter().unwrap_or_else(|| unreachable!());
    assert_eq!(news.state().selected(), "Media");
    let active: Vec<_> = news
        .buttons()
        .iter()
        .filter(|b| page.document().has_class(**b, "active"))
        .copied()
        .collect();
    assert_eq!(active, vec![media]);

    click(&mut page, ".sf-filter-btn[data-cat=\"All\"]");
    for tile in ["#n1", "#n2", "#n3", "#n4"] {
        assert!(shown(&page, tile), "{tile} hidden");
    }
}

#[test]
fn clicks_on_the_bar_outside_buttons_do_nothing() {
    let mut page = booted(NEWS_HTML, "/News");
    click(&mut page, ".sf-filter-btn[data-cat=\"ESG\"]");
    click(&mut page, ".sf-news-filter");
    assert_eq!(
        page.news_filter().map(|news| news.state().selected().to_owned()),
        Some("ESG".to_owned())
    );
}

#[test]
fn news_filter_skips_tiles_without_tags() {
    let page = booted(PROPERTY_HTML, "/News");
    let report = page.report().unwrap_or_else(|| unreachable!());
    assert!(matches!(report.outcome(Routine::NewsFilter), Some(Outcome::Skipped(_))));
    assert!(page.news_filter().is_none());
    assert!(all(&page, ".sf-news-filter").is_empty());
}

#[test]
fn news_filter_without_a_row_mutates_nothing() {
    let html = r#"<div class="tile-range"><span class="tags">Media</span></div>"#;
    let mut page = Page::from_html(html, location("/News"), FixesConfig::default());
    let before = page.document().element_count();
    let report = page.boot().clone();

    assert!(matches!(report.outcome(Routine::NewsFilter), Some(Outcome::Skipped(_))));
    assert_eq!(page.document().element_count(), before);
}

// ---- contact form ---------------------------------------------------------

const CONTACT_HTML: &str = r#"<section class="contact">
<form novalidate action="/api/contact"><input name="email"><button>Send</button></form>
</section>"#;

#[test]
fn notice_is_inserted_before_the_form() {
    let page = booted(CONTACT_HTML, "/Contact-Us");
    let doc = page.document();
    let form = first(&page, "form");
    let notice = page.contact_form().map(|c| c.notice()).unwrap_or_else(|| unreachable!());

    assert_eq!(doc.next_sibling(notice), Some(form));
    assert_eq!(
        doc.text_content(notice),
        "You can also reach us directly at enquiries@qicre.com. Our team will get back to you promptly."
    );
    let link = first(&page, ".sf-form-notice a");
    assert_eq!(doc.attr(link, "href"), Some("mailto:enquiries@qicre.com"));
}

#[test]
fn submitting_replaces_the_form_with_a_mailto_panel() {
    let mut page = booted(CONTACT_HTML, "/Contact-Us");
    let form = first(&page, "form");
    let event = page.submit(form).unwrap_or_else(|_| unreachable!());

    assert!(event.is_default_prevented());
    assert!(page.submissions().is_empty());
    assert!(!page.document().is_connected(form));
    assert!(page.query("form").unwrap_or_else(|_| unreachable!()).is_none());

    let fallback = first(&page, ".sf-contact-fallback");
    assert_eq!(page.contact_form().and_then(|c| c.fallback()), Some(fallback));
    let heading = first(&page, ".sf-contact-fallback h3");
    assert_eq!(page.document().text_content(heading), "Thank you for getting in touch");
    assert!(page
        .query(".sf-contact-fallback a[href=\"mailto:enquiries@qicre.com\"]")
        .unwrap_or_else(|_| unreachable!())
        .is_some());
}

#[test]
fn clicking_the_submit_button_goes_through_the_same_path() {
    let mut page = booted(CONTACT_HTML, "/Contact-Us");
    click(&mut page, "form button");
    assert!(page.submissions().is_empty());
    assert_eq!(all(&page, ".sf-contact-fallback").len(), 1);
}

#[test]
fn configured_email_is_used() {
    let mut config = FixesConfig::default();
    config.contact_form.email = "leasing@example.com".to_owned();
    let page = booted_with(CONTACT_HTML, "/Contact-Us", config);
    let link = first(&page, ".sf-form-notice a");
    assert_eq!(page.document().attr(link, "href"), Some("mailto:leasing@example.com"));
}

#[test]
fn ordinary_forms_submit_normally() {
    let mut page = booted(r#"<form action="/subscribe"><button type="submit">Go</button></form>"#, "/");
    let form = first(&page, "form");
    click(&mut page, "button");
    assert_eq!(page.submissions(), &[form]);
    assert!(all(&page, ".sf-form-notice").is_empty());
}

// ---- search notice --------------------------------------------------------

const SEARCH_HTML: &str = r#"<div id="root"><div>
  <header class="container"><nav>menu</nav></header>
  <div>
    <div class="container" id="search-box"><input type="search" placeholder="Search the site"></div>
    <main><p>results</p></main>
  </div>
</div></div>"#;

#[test]
fn search_route_gets_exactly_one_notice_after_the_input_container() {
    let mut page = booted(SEARCH_HTML, "/search-results");
    assert_eq!(all(&page, ".sf-search-notice").len(), 1);

    let notice = first(&page, ".sf-search-notice");
    let search_box = first(&page, "#search-box");
    assert_eq!(page.document().next_sibling(search_box), Some(notice));

    let links = all(&page, ".sf-search-notice .sf-browse-links a");
    let hrefs: Vec<_> = links
        .iter()
        .filter_map(|link| page.document().attr(*link, "href"))
        .collect();
    assert_eq!(
        hrefs,
        vec!["/Properties", "/News", "/ESG/ESG-overview", "/Brand_iQ", "/Contact-Us"]
    );

    page.boot();
    assert_eq!(all(&page, ".sf-search-notice").len(), 1);
}

#[test]
fn notice_carries_heading_and_explanation() {
    let page = booted(SEARCH_HTML, "/search");
    let heading = first(&page, ".sf-search-notice > h2");
    assert_eq!(page.document().text_content(heading), "Search");
    let body = first(&page, ".sf-search-notice > p");
    assert!(page
        .document()
        .text_content(body)
        .starts_with("Full-text search is not available in this version of the site."));
}

#[test]
fn other_routes_get_no_notice() {
    for path in ["/", "/News", "/research"] {
        let page = booted(SEARCH_HTML, path);
        assert!(all(&page, ".sf-search-notice").is_empty(), "{path}");
    }
    let page = booted(SEARCH_HTML, "https://example.com/SEARCH?q=office");
    assert_eq!(all(&page, ".sf-search-notice").len(), 1);
}

#[test]
fn without_an_input_the_notice_opens_the_main_area() {
    let page = booted(r#"<div class="container"><main><p>x</p></main></div>"#, "/search");
    let main = first(&page, "main");
    let notice = first(&page, ".sf-search-notice");
    assert_eq!(page.document().first_child(main), Some(notice));
}

#[test]
fn search_page_without_targets_is_left_alone() {
    let page = booted("<p>nothing here</p>", "/search");
    let report = page.report().unwrap_or_else(|| unreachable!());
    assert!(matches!(report.outcome(Routine::SearchNotice), Some(Outcome::Skipped(_))));
    assert!(page.search_notice().is_none());
}

// ---- nav dropdown ---------------------------------------------------------

const NAV_HTML: &str = r#"<nav><ul>
  <li class="nav-item" id="i1"><div class="nav-link-wrapper"><a>About</a></div><ul class="navbar-nav-items" id="s1"><li>Team</li></ul></li>
  <li class="nav-item" id="i2"><div class="nav-link-wrapper"><a>Properties</a></div><ul class="navbar-nav-items" id="s2"><li>Retail</li></ul></li>
  <li class="nav-item"><a>Contact</a></li>
</ul></nav>
<main><p id="outside">Body</p></main>"#;

fn is_open(page: &Page, selector: &str) -> bool {
    let submenu = first(page, selector);
    let doc = page.document();
    let open = doc.has_class(submenu, "sf-open");
    assert_eq!(
        open,
        doc.style_property(submenu, "display").as_deref() == Some("block"),
        "class and inline display disagree for {selector}"
    );
    open
}

#[test]
fn wrappers_get_a_pointer_cursor() {
    let page = booted(NAV_HTML, "/");
    let wrappers = all(&page, ".nav-link-wrapper");
    assert_eq!(wrappers.len(), 2);
    for wrapper in wrappers {
        assert_eq!(page.document().style_property(wrapper, "cursor").as_deref(), Some("pointer"));
    }
    assert_eq!(page.nav_dropdowns().map(|nav| nav.menus().len()), Some(2));
}

#[test]
fn opening_one_submenu_closes_the_other() {
    let mut page = booted(NAV_HTML, "/");
    click(&mut page, "#i1 .nav-link-wrapper a");
    assert!(is_open(&page, "#s1"));

    click(&mut page, "#i2 .nav-link-wrapper");
    assert!(!is_open(&page, "#s1"));
    assert!(is_open(&page, "#s2"));
    assert_eq!(all(&page, ".sf-open").len(), 1);

    click(&mut page, "#i2 .nav-link-wrapper");
    assert!(!is_open(&page, "#s2"));
    assert!(all(&page, ".sf-open").is_empty());
}

#[test]
fn outside_click_closes_open_submenus() {
    let mut page = booted(NAV_HTML, "/");
    click(&mut page, "#i1 .nav-link-wrapper");
    click(&mut page, "#outside");
    assert!(!is_open(&page, "#s1"));
    let submenu = first(&page, "#s1");
    assert!(!page.document().has_attr(submenu, "style"));
}

// ---- boot and dispatch ----------------------------------------------------

#[test]
fn bare_page_skips_every_routine() {
    let page = booted("<html><body><p>hi</p></body></html>", "/");
    let report = page.report().unwrap_or_else(|| unreachable!());
    assert_eq!(report.entries().len(), Routine::ALL.len());
    assert_eq!(report.applied().count(), 0);
    assert!(report
        .entries()
        .iter()
        .all(|entry| matches!(entry.outcome, Outcome::Skipped(_))));
}

#[test]
fn booting_twice_is_a_no_op() {
    let mut page = Page::from_html(CAROUSEL_HTML, location("/"), FixesConfig::default());
    let first_report = page.boot().clone();
    let elements = page.document().element_count();
    let second_report = page.boot().clone();

    assert_eq!(first_report, second_report);
    assert_eq!(page.document().element_count(), elements);
    assert_eq!(page.carousels().len(), 1);
}

#[test]
fn loading_documents_defer_boot_until_ready() {
    let mut page = Page::from_html(SEARCH_HTML, location("/search"), FixesConfig::default())
        .with_ready_state(ReadyState::Loading);
    assert!(page.boot_when_ready().is_none());
    assert!(page.report().is_none());
    assert!(all(&page, ".sf-search-notice").is_empty());

    let report = page.finish_loading().cloned();
    assert!(report.is_some_and(|report| report.is_applied(Routine::SearchNotice)));
    assert_eq!(page.ready_state(), ReadyState::Interactive);
    assert_eq!(all(&page, ".sf-search-notice").len(), 1);
    assert!(page.finish_loading().is_none());
}

#[test]
fn ready_documents_boot_immediately() {
    let mut page = Page::from_html(SEARCH_HTML, location("/search"), FixesConfig::default())
        .with_ready_state(ReadyState::Interactive);
    assert!(page.boot_when_ready().is_some());
    assert!(page.finish_loading().is_none());
}

#[test]
fn listeners_from_a_failed_install_are_discarded() {
    let mut page = booted(NAV_HTML, "/");
    let before = page.listener_count();
    let outside = first(&page, "#outside");

    let failed: FixResult<()> = page.with_pending_listeners(|_, listeners| {
        listeners.add(outside, EventKind::Click, Handler::NavToggle(0));
        Err(FixError::new("dom.cycle", "installer gave up"))
    });
    assert!(failed.is_err());
    assert_eq!(page.listener_count(), before);
    click(&mut page, "#outside");
    assert!(all(&page, ".sf-open").is_empty());

    let installed: FixResult<()> = page.with_pending_listeners(|_, listeners| {
        listeners.add(outside, EventKind::Click, Handler::NavToggle(0));
        Ok(())
    });
    assert!(installed.is_ok());
    assert_eq!(page.listener_count(), before + 1);
    click(&mut page, "#outside");
    assert_eq!(all(&page, ".sf-open").len(), 1);
}

#[test]
fn events_for_foreign_nodes_are_rejected() {
    let mut page = booted(NAV_HTML, "/");
    let mut other = Document::new();
    let mut stray = other.root();
    for _ in 0..500 {
        stray = other.create_element("div");
    }
    let error = page.click(stray).err().unwrap_or_else(|| unreachable!());
    assert_eq!(error.code, "fixes.unknown_node");
}

#[test]
fn check_rejects_non_checkboxes() {
    let mut page = booted(NAV_HTML, "/");
    let outside = first(&page, "#outside");
    let error = page.check(outside, true).err().unwrap_or_else(|| unreachable!());
    assert_eq!(error.code, "fixes.not_checkable");
}

#[test]
fn serialized_output_carries_the_patches() {
    let page = booted(CONTACT_HTML, "/Contact-Us");
    let html = page.to_html();
    assert!(html.contains(
        "<div class=\"sf-form-notice\">You can also reach us directly at <a href=\"mailto:enquiries@qicre.com\">enquiries@qicre.com</a>. Our team will get back to you promptly.</div><form novalidate"
    ));
}
