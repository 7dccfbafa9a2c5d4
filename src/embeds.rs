use poise::serenity_prelude::CreateEmbed;

/// Description length at which [`generate_embeds`] starts a new embed.
pub const DEFAULT_EMBED_THRESHOLD: usize = 2050;

pub fn error_embed(color: u32, message: &str) -> CreateEmbed {
    CreateEmbed::new()
        .description(format!("❌ | {}", message))
        .color(color)
}

pub fn success_embed(color: u32, message: &str) -> CreateEmbed {
    CreateEmbed::new()
        .description(format!("✅ | {}", message))
        .color(color)
}

pub fn reply_embed(color: u32, message: &str) -> CreateEmbed {
    CreateEmbed::new().description(message).color(color)
}

/// Joins entries into descriptions, starting a new one whenever the next
/// entry would reach `threshold` characters. An entry is never split.
pub fn pack_descriptions<I>(entries: I, threshold: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut descriptions: Vec<String> = Vec::new();
    for entry in entries {
        let fits = descriptions
            .last()
            .is_some_and(|last| last.chars().count() + entry.chars().count() < threshold);
        if fits {
            if let Some(last) = descriptions.last_mut() {
                last.push_str(&entry);
            }
        } else {
            descriptions.push(entry);
        }
    }
    descriptions
}

/// Lays `entries` out over as many embeds as needed. `generate_embed`
/// receives the embed's index and builds everything but the description.
pub fn generate_embeds<T>(
    entries: &[T],
    generate_embed: impl Fn(usize) -> CreateEmbed,
    generate_entry: impl Fn(&T) -> String,
    threshold: usize,
) -> Vec<CreateEmbed> {
    pack_descriptions(entries.iter().map(generate_entry), threshold)
        .into_iter()
        .enumerate()
        .map(|(index, description)| generate_embed(index).description(description))
        .collect()
}

/// Splits `items` into consecutive groups of at most `size`.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return Vec::new();
    }
    items.chunks(size).map(<[T]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::MAX_ITEMS_PER_SELECT_MENU;

    fn description(embed: &CreateEmbed) -> String {
        let value = serde_json::to_value(embed).unwrap();
        value["description"].as_str().unwrap_or_default().to_string()
    }

    #[test]
    fn test_status_embeds_prefix_message() {
        assert_eq!(description(&error_embed(0, "nope")), "❌ | nope");
        assert_eq!(description(&success_embed(0, "done")), "✅ | done");
        assert_eq!(description(&reply_embed(0, "plain")), "plain");
    }

    #[test]
    fn test_pack_descriptions_respects_threshold() {
        let entries = vec!["aaaa".to_string(), "bbbb".to_string(), "cccc".to_string()];
        assert_eq!(pack_descriptions(entries.clone(), 9), vec!["aaaabbbb", "cccc"]);
        assert_eq!(pack_descriptions(entries.clone(), 8), vec!["aaaa", "bbbb", "cccc"]);
        assert_eq!(pack_descriptions(entries, 100), vec!["aaaabbbbcccc"]);
        assert!(pack_descriptions(Vec::new(), 10).is_empty());
    }

    #[test]
    fn test_generate_embeds_indexes_pages() {
        let entries: Vec<u32> = (0..30).collect();
        let embeds = generate_embeds(
            &entries,
            |index| CreateEmbed::new().title(format!("Page {}", index + 1)),
            |n| format!("- entry {:02}\n", n),
            60,
        );
        assert!(embeds.len() > 1);
        let first = serde_json::to_value(&embeds[0]).unwrap();
        assert_eq!(first["title"], "Page 1");
        assert!(description(&embeds[0]).starts_with("- entry 00\n"));
    }

    #[test]
    fn test_chunk() {
        let items: Vec<usize> = (0..60).collect();
        let groups = chunk(&items, MAX_ITEMS_PER_SELECT_MENU);
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![25, 25, 10]);
        assert!(chunk(&items, 0).is_empty());
        assert!(chunk::<u8>(&[], 5).is_empty());
    }
}
