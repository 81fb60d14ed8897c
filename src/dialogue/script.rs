//! Built-in DenisBot script.
//!
//! Pure content. Each step is a batch of lines from the assistant and the
//! moves that follow it.

use super::graph::StepGraph;
use super::model::{Attachment, FreeTextHandler, Step};
use super::navigation::NavigationShortcut;

/// Entry step of the built-in script.
pub const ENTRY: &str = "start";

/// Step ids that double as navigation shortcuts.
pub mod shortcuts {
    pub const PROJECTS: &str = "goto-projects";
    pub const SKILLS: &str = "goto-skills";
    pub const BLOG: &str = "goto-blog";
    pub const CONTACT: &str = "goto-contact";
}

const LIFE_QUESTION: &str = "What side of Denis Mwaki's life would you like us to discuss?";

fn life_menu(step: Step) -> Step {
    step.with_choice("General Life ♻", "general-life")
        .with_choice("Professional Life ⬆", "professional-life")
        .with_choice("Romantic Life ❤", "romantic-life")
        .with_choice("Go Back ↩", "profile-created")
}

/// The dialogue shipped with the site.
pub fn builtin() -> StepGraph {
    let steps = vec![
        Step::new("start")
            .with_messages([
                "Hello there! 👋",
                "I'm DenisBot, Denis Mwaki's personal AI assistant. Good to see you... uhmm",
                "What's your name? 😅",
            ])
            .with_free_text(FreeTextHandler::CaptureName {
                target: "profile-created".into(),
            }),
        Step::new("profile-created")
            .with_messages([
                "Great to meet you! I hope you feel right at home. 🤗",
                "So which mode shall we explore?",
            ])
            .with_choice("Story Mode", "story-mode")
            .with_choice("Sandbox Mode", "sandbox-mode")
            .with_choice("Action Mode", "action-mode")
            .with_choice("Website Pricing", "pricing-mode")
            .with_choice("End Conversation", "end-conversation"),
        life_menu(Step::new("story-mode").with_messages([LIFE_QUESTION])),
        Step::new("romantic-life")
            .with_attachment(Attachment {
                src: "/RomanticLaugh.gif".into(),
                alt: Some("Chat Animation".into()),
            })
            .with_choice("Nice Try! 😄", "try-again"),
        life_menu(Step::new("try-again").with_messages([
            "Okay you've had your fun, be serious now. 🧍🏿‍♀️",
            LIFE_QUESTION,
        ])),
        Step::new("general-life")
            .with_messages([
                "Denis Mwaki is passionate about technology and innovation. Outside of work, he enjoys exploring new tech trends, contributing to open source projects, and sharing knowledge with the tech community.",
                "Would you like to know more?",
            ])
            .with_choice("Yes absolutely!", "general-life-more")
            .with_choice("No, That's enough", "story-mode"),
        Step::new("general-life-more")
            .with_messages([
                "He writes about design and development on his blog, mentors upcoming developers, and is always up for a good game of Tetris. 🎮",
                "Anything else you'd like to explore, {name}?",
            ])
            .with_choice("Read the Blog 📝", shortcuts::BLOG)
            .with_choice("Go Back ↩", "story-mode"),
        Step::new("professional-life")
            .with_messages([
                "Denis Mwaki is a full-stack developer building web platforms with React, Node.js, TypeScript and cloud databases.",
                "His recent work spans job portals, tourism booking and AI-powered agriculture tools, several with M-Pesa payment integration.",
                "Would you like to know more?",
            ])
            .with_choice("Yes, tell me more", "professional-life-more")
            .with_choice("Show me the projects", shortcuts::PROJECTS)
            .with_choice("Go Back ↩", "story-mode"),
        Step::new("professional-life-more")
            .with_messages([
                "He cares about performance, accessible design systems and shipping products people actually use.",
                "The skills section has the full toolbox.",
            ])
            .with_choice("View Skills 🛠", shortcuts::SKILLS)
            .with_choice("Go Back ↩", "story-mode"),
        Step::new("sandbox-mode")
            .with_messages([
                "Sandbox Mode lets you explore the site on your own terms.",
                "Where would you like to go?",
            ])
            .with_choice("Projects 🚀", shortcuts::PROJECTS)
            .with_choice("Skills 🛠", shortcuts::SKILLS)
            .with_choice("Blog 📝", shortcuts::BLOG)
            .with_choice("Go Back ↩", "profile-created"),
        Step::new("action-mode")
            .with_messages([
                "Ready to get something done? 💼",
                "You can reach Denis through the contact section, or tap the WhatsApp button for a direct chat.",
            ])
            .with_choice("Contact Denis 📬", shortcuts::CONTACT)
            .with_choice("See his work first", shortcuts::PROJECTS)
            .with_choice("Go Back ↩", "profile-created"),
        Step::new("pricing-mode")
            .with_messages([
                "Every website is different, so pricing depends on scope: landing pages, multi-page business sites, and full web applications.",
                "Would you like a tailored quote?",
            ])
            .with_choice("How is pricing worked out?", "pricing-details")
            .with_choice("Get a Quote 💬", shortcuts::CONTACT)
            .with_choice("Go Back ↩", "profile-created"),
        Step::new("pricing-details")
            .with_messages([
                "A quote covers design, development, hosting setup and a round of revisions.",
                "Payment integrations such as M-Pesa and ongoing maintenance are quoted separately.",
            ])
            .with_choice("Get a Quote 💬", shortcuts::CONTACT)
            .with_choice("Go Back ↩", "pricing-mode"),
        Step::new("end-conversation").with_messages([
            "Thanks for stopping by, {name}! 👋",
            "Feel free to come back anytime.",
        ]),
        Step::new(shortcuts::PROJECTS)
            .with_messages(["Taking you to the projects section... 🚀"])
            .with_navigation(NavigationShortcut::scroll_and_close("projects-section")),
        Step::new(shortcuts::SKILLS)
            .with_messages(["Taking you to the skills section... 🛠"])
            .with_navigation(NavigationShortcut::scroll_and_close("skills-section")),
        Step::new(shortcuts::BLOG)
            .with_messages(["Opening the blog... 📝"])
            .with_navigation(NavigationShortcut::route("/blog")),
        Step::new(shortcuts::CONTACT)
            .with_messages(["Taking you to the contact section... 📬"])
            .with_navigation(NavigationShortcut::scroll_and_close("contact-section")),
    ];
    StepGraph::new(ENTRY, steps)
}
