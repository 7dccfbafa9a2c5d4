//! Response payloads and the interactive components flows attach to them.
//!
//! Components are plain data with public fields so flows can find their
//! custom ids again after sending; they are turned into serenity builders
//! only at the platform boundary.

use poise::serenity_prelude as serenity;
use serenity::{
    ChannelId, CreateActionRow, CreateAttachment, CreateButton, CreateEmbed, CreateInputText,
    CreateModal, CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption, RoleId, UserId,
};
use uuid::Uuid;

pub const MAX_ITEMS_PER_SELECT_MENU: usize = 25;
pub const MAX_BUTTONS_PER_ROW: usize = 5;
pub const MAX_EMBED_FIELD_VALUE_LENGTH: usize = 1024;

/// Custom id of the confirmation button appended by `FlowSession::use_menus`.
pub const SUBMIT_BUTTON_ID: &str = "submit";

fn random_id() -> String {
    Uuid::new_v4().to_string()
}

/// What a response carries. `None` fields are left untouched by edits
/// unless the payload is normalized first.
#[derive(Debug, Clone, Default)]
pub struct ResponsePayload {
    pub content: Option<String>,
    pub embeds: Option<Vec<CreateEmbed>>,
    pub files: Option<Vec<CreateAttachment>>,
    pub components: Option<Vec<ComponentRow>>,
}

impl ResponsePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn embed(mut self, embed: CreateEmbed) -> Self {
        self.embeds.get_or_insert_with(Vec::new).push(embed);
        self
    }

    pub fn embeds(mut self, embeds: Vec<CreateEmbed>) -> Self {
        self.embeds = Some(embeds);
        self
    }

    pub fn file(mut self, file: CreateAttachment) -> Self {
        self.files.get_or_insert_with(Vec::new).push(file);
        self
    }

    pub fn components(mut self, components: Vec<ComponentRow>) -> Self {
        self.components = Some(components);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonStyle {
    Primary,
    #[default]
    Secondary,
    Success,
    Danger,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// `None` only for link buttons
    pub custom_id: Option<String>,
    pub label: String,
    pub url: Option<String>,
    pub style: ButtonStyle,
}

impl Button {
    /// A secondary button with a random custom id.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            custom_id: Some(random_id()),
            label: label.into(),
            url: None,
            style: ButtonStyle::Secondary,
        }
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            custom_id: None,
            label: label.into(),
            url: Some(url.into()),
            style: ButtonStyle::Link,
        }
    }

    pub fn id(mut self, custom_id: impl Into<String>) -> Self {
        self.custom_id = Some(custom_id.into());
        self
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    fn to_create_button(&self) -> CreateButton {
        let button = match (&self.url, &self.custom_id) {
            (Some(url), _) => CreateButton::new_link(url),
            (None, Some(custom_id)) => CreateButton::new(custom_id).style(match self.style {
                ButtonStyle::Primary => serenity::ButtonStyle::Primary,
                ButtonStyle::Success => serenity::ButtonStyle::Success,
                ButtonStyle::Danger => serenity::ButtonStyle::Danger,
                ButtonStyle::Secondary | ButtonStyle::Link => serenity::ButtonStyle::Secondary,
            }),
            (None, None) => CreateButton::new(random_id()),
        };
        button.label(&self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectKind {
    Channel { channel_types: Vec<serenity::ChannelType> },
    Role,
    User,
    String { options: Vec<SelectOption> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectMenu {
    pub custom_id: String,
    pub kind: SelectKind,
    pub placeholder: String,
    pub min_values: Option<u8>,
    pub max_values: Option<u8>,
    /// Channel/role/user ids, or option values for string menus
    pub default_values: Vec<String>,
}

impl SelectMenu {
    pub fn new(kind: SelectKind, placeholder: impl Into<String>) -> Self {
        Self {
            custom_id: random_id(),
            kind,
            placeholder: placeholder.into(),
            min_values: None,
            max_values: None,
            default_values: Vec::new(),
        }
    }

    pub fn channel(placeholder: impl Into<String>, channel_types: Vec<serenity::ChannelType>) -> Self {
        Self::new(SelectKind::Channel { channel_types }, placeholder)
    }

    pub fn role(placeholder: impl Into<String>) -> Self {
        Self::new(SelectKind::Role, placeholder)
    }

    pub fn user(placeholder: impl Into<String>) -> Self {
        Self::new(SelectKind::User, placeholder)
    }

    pub fn string(placeholder: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::new(SelectKind::String { options }, placeholder)
    }

    pub fn id(mut self, custom_id: impl Into<String>) -> Self {
        self.custom_id = custom_id.into();
        self
    }

    pub fn min_values(mut self, min: u8) -> Self {
        self.min_values = Some(min);
        self
    }

    pub fn max_values(mut self, max: u8) -> Self {
        self.max_values = Some(max);
        self
    }

    pub fn default_values(mut self, values: Vec<String>) -> Self {
        self.default_values = values;
        self
    }

    fn to_create_select_menu(&self) -> CreateSelectMenu {
        fn ids<T: From<u64>>(values: &[String]) -> Option<Vec<T>> {
            let parsed: Vec<T> = values
                .iter()
                .filter_map(|value| value.parse::<u64>().ok())
                .map(T::from)
                .collect();
            (!parsed.is_empty()).then_some(parsed)
        }

        let kind = match &self.kind {
            SelectKind::Channel { channel_types } => CreateSelectMenuKind::Channel {
                channel_types: (!channel_types.is_empty()).then(|| channel_types.clone()),
                default_channels: ids::<ChannelId>(&self.default_values),
            },
            SelectKind::Role => CreateSelectMenuKind::Role {
                default_roles: ids::<RoleId>(&self.default_values),
            },
            SelectKind::User => CreateSelectMenuKind::User {
                default_users: ids::<UserId>(&self.default_values),
            },
            SelectKind::String { options } => CreateSelectMenuKind::String {
                options: options
                    .iter()
                    .map(|option| {
                        let mut created = CreateSelectMenuOption::new(&option.label, &option.value)
                            .default_selection(self.default_values.contains(&option.value));
                        if let Some(description) = &option.description {
                            created = created.description(description);
                        }
                        created
                    })
                    .collect(),
            },
        };

        let mut menu = CreateSelectMenu::new(&self.custom_id, kind).placeholder(&self.placeholder);
        if let Some(min) = self.min_values {
            menu = menu.min_values(min);
        }
        if let Some(max) = self.max_values {
            menu = menu.max_values(max);
        }
        menu
    }
}

/// One action row: either up to five buttons or a single select menu.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentRow {
    Buttons(Vec<Button>),
    Select(SelectMenu),
}

impl ComponentRow {
    pub fn select_custom_id(&self) -> Option<&str> {
        match self {
            ComponentRow::Select(menu) => Some(&menu.custom_id),
            ComponentRow::Buttons(_) => None,
        }
    }

    pub fn to_action_row(&self) -> CreateActionRow {
        match self {
            ComponentRow::Buttons(buttons) => CreateActionRow::Buttons(
                buttons
                    .iter()
                    .take(MAX_BUTTONS_PER_ROW)
                    .map(Button::to_create_button)
                    .collect(),
            ),
            ComponentRow::Select(menu) => CreateActionRow::SelectMenu(menu.to_create_select_menu()),
        }
    }
}

pub fn button_row(buttons: Vec<Button>) -> ComponentRow {
    ComponentRow::Buttons(buttons)
}

pub fn select_row(menu: SelectMenu) -> ComponentRow {
    ComponentRow::Select(menu)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputStyle {
    #[default]
    Short,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInputSpec {
    pub label: String,
    pub required: Option<bool>,
    pub min_length: Option<u16>,
    pub max_length: Option<u16>,
    pub placeholder: Option<String>,
    pub style: InputStyle,
    pub value: Option<String>,
}

impl TextInputSpec {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            required: None,
            min_length: None,
            max_length: None,
            placeholder: None,
            style: InputStyle::Short,
            value: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn length(mut self, min: Option<u16>, max: Option<u16>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn paragraph(mut self) -> Self {
        self.style = InputStyle::Paragraph;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalSpec {
    pub title: String,
    pub inputs: Vec<TextInputSpec>,
}

impl ModalSpec {
    pub fn new(title: impl Into<String>, inputs: Vec<TextInputSpec>) -> Self {
        Self {
            title: title.into(),
            inputs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub custom_id: String,
    pub spec: TextInputSpec,
}

/// A modal ready to be shown, with fresh ids for itself and every input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

impl Modal {
    pub fn to_create_modal(&self) -> CreateModal {
        let rows = self
            .inputs
            .iter()
            .map(|input| {
                let style = match input.spec.style {
                    InputStyle::Short => serenity::InputTextStyle::Short,
                    InputStyle::Paragraph => serenity::InputTextStyle::Paragraph,
                };
                let mut text = CreateInputText::new(style, &input.spec.label, &input.custom_id);
                if let Some(required) = input.spec.required {
                    text = text.required(required);
                }
                if let Some(min) = input.spec.min_length {
                    text = text.min_length(min);
                }
                if let Some(max) = input.spec.max_length {
                    text = text.max_length(max);
                }
                if let Some(placeholder) = &input.spec.placeholder {
                    text = text.placeholder(placeholder);
                }
                if let Some(value) = &input.spec.value {
                    text = text.value(value);
                }
                CreateActionRow::InputText(text)
            })
            .collect();
        CreateModal::new(&self.custom_id, &self.title).components(rows)
    }
}

pub fn modal(spec: ModalSpec) -> Modal {
    Modal {
        custom_id: random_id(),
        title: spec.title,
        inputs: spec
            .inputs
            .into_iter()
            .map(|spec| TextInput {
                custom_id: random_id(),
                spec,
            })
            .collect(),
    }
}
