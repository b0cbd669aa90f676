//! Static page markup.
//!
//! The search landing page, the shared style block injected into generated
//! pages, the error page, and the cache listing page all live here so the
//! pipeline modules splice strings rather than own markup.

/// The search landing page served at `/`.
pub const SEARCH_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>INFINITE AI WEB</title>
    <style>
        body {
            font-family: Arial, sans-serif;
            display: flex;
            flex-direction: column;
            align-items: center;
            justify-content: center;
            height: 100vh;
            margin: 0;
            position: relative;
        }
        .logo {
            font-size: 48px;
            font-weight: bold;
            margin-bottom: 30px;
            color: #4285f4;
            text-align: center;
        }
        .search-container {
            width: 100%;
            max-width: 584px;
        }
        .search-bar {
            width: 100%;
            padding: 12px 20px;
            margin: 8px 0;
            box-sizing: border-box;
            border: 1px solid #dfe1e5;
            border-radius: 24px;
            font-size: 16px;
            outline: none;
        }
        .search-bar:hover, .search-bar:focus {
            box-shadow: 0 1px 6px rgba(32,33,36,.28);
            border-color: rgba(223,225,229,0);
        }
        .search-button {
            background-color: #f8f9fa;
            border: 1px solid #f8f9fa;
            border-radius: 4px;
            color: #3c4043;
            font-family: Arial, sans-serif;
            font-size: 14px;
            margin: 11px 4px;
            padding: 0 16px;
            line-height: 27px;
            height: 36px;
            min-width: 54px;
            text-align: center;
            cursor: pointer;
            user-select: none;
        }
        .search-button:hover {
            box-shadow: 0 1px 1px rgba(0,0,0,.1);
            background-color: #f8f9fa;
            border: 1px solid #dadce0;
            color: #202124;
        }
        .buttons {
            display: flex;
            justify-content: center;
            align-items: center;
            margin-top: 10px;
        }
        .infinite {
            background: linear-gradient(to right, #4285f4, #ea4335, #fbbc05, #34a853, #4285f4);
            -webkit-background-clip: text;
            -webkit-text-fill-color: transparent;
            background-size: 800% 100%;
            animation: gradient 10s linear infinite;
        }
        @keyframes gradient {
            0% { background-position: 0% 0%; }
            100% { background-position: 800% 0%; }
        }
        .links-container {
            position: absolute;
            top: 20px;
            right: 20px;
        }
        .links-container a {
            color: #70757a;
            text-decoration: none;
            font-size: 14px;
        }
        .links-container a:hover {
            text-decoration: underline;
        }
    </style>
</head>
<body>
    <div class="links-container">
        <a href="/index">Saved Searches</a>
    </div>
    <div class="logo"><span class="infinite">INFINITE AI WEB</span></div>
    <div class="search-container">
        <form action="/search" method="GET">
            <input type="text" class="search-bar" name="query" placeholder="Search the web..." autofocus>
            <div class="buttons">
                <button type="submit" class="search-button">Search</button>
            </div>
        </form>
    </div>
</body>
</html>
"#;

/// Shared style block injected into every generated HTML page that does
/// not already carry one.
pub const CONTENT_STYLE: &str = r#"<style>
        body {
            font-family: Arial, sans-serif;
            max-width: 900px;
            margin: 0 auto;
            padding: 24px;
            line-height: 1.6;
            color: #202124;
        }
        h1, h2, h3 { color: #1a0dab; }
        h1 { border-bottom: 2px solid #4285f4; padding-bottom: 8px; }
        a { color: #1a0dab; }
        table { border-collapse: collapse; width: 100%; margin: 16px 0; }
        th, td { border: 1px solid #dadce0; padding: 8px 12px; text-align: left; }
        th { background-color: #f8f9fa; }
        pre, code {
            background-color: #f8f9fa;
            border-radius: 4px;
            font-family: monospace;
        }
        pre { padding: 12px; overflow-x: auto; }
        img.page-illustration { max-width: 100%; border-radius: 8px; margin: 16px 0; }
        .back-to-search { margin-top: 40px; font-size: 14px; }
        .back-to-search a { color: #70757a; text-decoration: none; }
        .back-to-search a:hover { text-decoration: underline; }
    </style>"#;

/// The back-navigation block appended to generated pages.
pub const BACK_LINK: &str = r#"<div class="back-to-search">
<a href="/">Back to Search</a>
</div>"#;

/// Render the error page shown when generation fails.
pub fn error_page(path: &str, error: &dyn std::fmt::Display) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Error - INFINITE AI WEB</title>
    <style>
        body {{ font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }}
        h1 {{ color: #ea4335; }}
        .home-link {{ margin-top: 30px; }}
    </style>
</head>
<body>
    <h1>Error Generating Content</h1>
    <p>There was an error generating content for: <strong>{path}</strong></p>
    <p>Error details: {error}</p>
    <div class="home-link">
        <a href="/">Back to Search</a>
    </div>
</body>
</html>
"#
    )
}

/// Render the cache listing page from `(href, title)` pairs.
pub fn index_page(entries: &[(String, String)]) -> String {
    let mut items = String::new();
    for (href, title) in entries {
        items.push_str(&format!("        <li><a href=\"{href}\">{title}</a></li>\n"));
    }
    let body = if entries.is_empty() {
        "    <p>No pages generated yet. Use the search to create some.</p>\n".to_string()
    } else {
        format!("    <ul>\n{items}    </ul>\n")
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Saved Searches - INFINITE AI WEB</title>
    <style>
        body {{ font-family: Arial, sans-serif; max-width: 800px; margin: 40px auto; padding: 0 20px; }}
        h1 {{ color: #333; }}
        ul {{ list-style-type: none; padding: 0; }}
        li {{ margin: 10px 0; }}
        a {{ text-decoration: none; color: #0066cc; }}
        a:hover {{ text-decoration: underline; }}
    </style>
</head>
<body>
    <h1>Saved Searches</h1>
    <p>Every page generated so far, straight from the cache.</p>
{body}    <p><a href="/">Back to Search</a></p>
</body>
</html>
"#
    )
}
