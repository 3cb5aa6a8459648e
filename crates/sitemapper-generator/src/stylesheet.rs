//! Sitemap stylesheet.
//!
//! Browsers render the XML sitemaps through an XSLT stylesheet. The template
//! carries a `{{blog-url}}` token that is replaced with the absolute URL of
//! the sitemap index, so every rendered sitemap can link back to it.

use std::{fs, io, path::Path};

use crate::manager::escape_xml;

/// Token replaced with the index URL.
pub const BLOG_URL_TOKEN: &str = "{{blog-url}}";

/// Load the stylesheet template: the file at `custom` if given, else the
/// bundled one.
pub fn load_template(custom: Option<&Path>) -> io::Result<String> {
    match custom {
        Some(path) => fs::read_to_string(path),
        None => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}

/// Replace every `{{blog-url}}` in `template` with the XML-escaped
/// `index_url`.
#[must_use]
pub fn render(template: &str, index_url: &str) -> String {
    template.replace(BLOG_URL_TOKEN, &escape_xml(index_url))
}

/// Bundled XSLT stylesheet with light/dark mode support. Renders the index
/// as a list of sitemaps and each resource sitemap as a table of URLs.
pub const DEFAULT_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xsl:stylesheet version="2.0"
    xmlns:xsl="http://www.w3.org/1999/XSL/Transform"
    xmlns:sitemap="http://www.sitemaps.org/schemas/sitemap/0.9"
    xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">

<xsl:output method="html" version="1.0" encoding="UTF-8" indent="yes"/>

<xsl:template match="/">
<html lang="en">
<head>
    <meta charset="UTF-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
    <title>XML Sitemap</title>
    <style>
        :root {
            --bg-primary: #ffffff;
            --bg-secondary: #f8fafc;
            --bg-tertiary: #f1f5f9;
            --text-primary: #0f172a;
            --text-secondary: #475569;
            --text-muted: #94a3b8;
            --border-color: #e2e8f0;
            --accent-color: #3b82f6;
        }

        @media (prefers-color-scheme: dark) {
            :root {
                --bg-primary: #0f172a;
                --bg-secondary: #1e293b;
                --bg-tertiary: #334155;
                --text-primary: #f1f5f9;
                --text-secondary: #cbd5e1;
                --text-muted: #64748b;
                --border-color: #334155;
                --accent-color: #60a5fa;
            }
        }

        body {
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
            background-color: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
            padding: 2rem;
        }

        .container {
            max-width: 1200px;
            margin: 0 auto;
        }

        header {
            margin-bottom: 1.5rem;
            padding-bottom: 1rem;
            border-bottom: 1px solid var(--border-color);
        }

        .subtitle {
            color: var(--text-secondary);
            font-size: 0.875rem;
        }

        table {
            width: 100%;
            border-collapse: collapse;
            background: var(--bg-secondary);
            border: 1px solid var(--border-color);
        }

        thead {
            background: var(--bg-tertiary);
        }

        th, td {
            padding: 0.75rem 1rem;
            text-align: left;
            border-bottom: 1px solid var(--border-color);
            font-size: 0.875rem;
        }

        a {
            color: var(--accent-color);
            text-decoration: none;
            word-break: break-all;
        }

        .muted {
            color: var(--text-muted);
        }
    </style>
</head>
<body>
    <div class="container">
        <header>
            <h1>XML Sitemap</h1>
            <xsl:choose>
                <xsl:when test="sitemap:sitemapindex">
                    <p class="subtitle">
                        This index contains <xsl:value-of select="count(sitemap:sitemapindex/sitemap:sitemap)"/> sitemaps.
                    </p>
                </xsl:when>
                <xsl:otherwise>
                    <p class="subtitle">
                        <a href="{{blog-url}}">&#8592; Sitemap index</a>
                        &#183; <xsl:value-of select="count(sitemap:urlset/sitemap:url)"/> URLs
                    </p>
                </xsl:otherwise>
            </xsl:choose>
        </header>

        <xsl:choose>
            <xsl:when test="sitemap:sitemapindex">
                <table>
                    <thead>
                        <tr>
                            <th>Sitemap</th>
                            <th>Last Modified</th>
                        </tr>
                    </thead>
                    <tbody>
                        <xsl:for-each select="sitemap:sitemapindex/sitemap:sitemap">
                            <tr>
                                <td><a href="{sitemap:loc}"><xsl:value-of select="sitemap:loc"/></a></td>
                                <td class="muted"><xsl:value-of select="sitemap:lastmod"/></td>
                            </tr>
                        </xsl:for-each>
                    </tbody>
                </table>
            </xsl:when>
            <xsl:otherwise>
                <table>
                    <thead>
                        <tr>
                            <th>URL</th>
                            <th>Images</th>
                            <th>Last Modified</th>
                        </tr>
                    </thead>
                    <tbody>
                        <xsl:for-each select="sitemap:urlset/sitemap:url">
                            <tr>
                                <td><a href="{sitemap:loc}"><xsl:value-of select="sitemap:loc"/></a></td>
                                <td class="muted"><xsl:value-of select="count(image:image)"/></td>
                                <td class="muted"><xsl:value-of select="sitemap:lastmod"/></td>
                            </tr>
                        </xsl:for-each>
                    </tbody>
                </table>
            </xsl:otherwise>
        </xsl:choose>
    </div>
</body>
</html>
</xsl:template>

</xsl:stylesheet>
"#;
