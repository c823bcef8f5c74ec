//! Casual check-in persona.
//!
//! Utterances are classified by keyword sets checked in priority order
//! (stress, fatigue, positive mood, exercise). The first matching set decides the
//! reply category and the remembered topic; within a category the reply is a
//! uniform random pick with no memory of earlier picks.

use rand::RngCore;

use super::{DialogueScript, Persona, contains_any, pick};

pub(crate) const GREETINGS: [&str; 4] = [
    "Hallo! Leuk je te zien. Hoe gaat het vandaag met je?",
    "Hey! Fijn je te spreken. Hoe voel je je vandaag?",
    "Goedemorgen! Ik ben je lifestyle coach. Wat kan ik voor je doen?",
    "Welkom! Ik ben blij je weer te zien. Hoe gaat het?",
];

pub(crate) const CLOSINGS: [&str; 4] = [
    "Bedankt voor dit gesprek! Je doet het prima. Zullen we volgende week weer praten?",
    "Fijn dat we dit konden bespreken. Hou vol en zorg goed voor jezelf!",
    "Tot ziens! Onthoud: je bent sterker dan je denkt.",
    "Dank je voor je vertrouwen. Tot snel!",
];

pub(crate) const STRESS_REPLIES: [&str; 4] = [
    "Dat klinkt lastig. Wat geeft je het meeste stress op dit moment?",
    "Ik snap het. Stress kan echt uitputtend zijn. Kun je me meer vertellen?",
    "Dat begrijp ik. Heb je al iets geprobeerd om dit aan te pakken?",
    "Sorry dat je stress hebt. Wat zou je willen veranderen?",
];

pub(crate) const FATIGUE_REPLIES: [&str; 4] = [
    "Het klinkt alsof je wat rust nodig hebt. Hoe veel slaap krijg je momenteel?",
    "Vermoeide ben je? Wil je graag wat tips voor beter slapen?",
    "Ik hoor dat je moe bent. Laten we samen aan je slaapschema werken.",
    "Slaperigheid kan veel invloed hebben. Wil je dat bespreken?",
];

pub(crate) const POSITIVE_REPLIES: [&str; 4] = [
    "Dat is geweldig! Waar ben je vandaag trots op?",
    "Echt super om te horen! Wat gaat er goed?",
    "Fijn! Wat is het geheim van je goeie dag?",
    "Prachtig! Ik ben blij voor je!",
];

pub(crate) const EXERCISE_REPLIES: [&str; 4] = [
    "Mooi dat je actief bent! Wat voor beweging doe je graag?",
    "Super! Hoeveel keer per week train je?",
    "Geweldig dat je sport! Hoe voelt dat voor je?",
    "Beweging is goed! Wat hou je het leukst?",
];

pub(crate) const FALLBACK_REPLIES: [&str; 4] = [
    "Dank je dat je dit met me deelt. Wat zou je graag willen veranderen?",
    "Interessant. Hoe lang heb je dit al?",
    "Ik begrijp het. Hoe zou je je voelen als dit beter zou gaan?",
    "Bedankt voor je openheid. Wat kan ik voor je doen?",
];

const STRESS_CUES: [&str; 4] = ["stress", "gestrest", "angstig", "zorgen"];
const FATIGUE_CUES: [&str; 4] = ["moe", "vermoeid", "uitgeput", "slaperig"];
const POSITIVE_CUES: [&str; 4] = ["goed", "super", "fantastisch", "prima"];
const EXERCISE_CUES: [&str; 6] = ["beweeg", "sport", "gym", "rennen", "yoga", "fitness"];

/// Topic the coach is currently talking about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Stress,
    Sleep,
    Mood,
    Exercise,
}

impl Topic {
    /// Classify an utterance; earlier categories win over later ones.
    pub fn classify(user_text: &str) -> Option<Self> {
        let lowered = user_text.to_lowercase();
        if contains_any(&lowered, &STRESS_CUES) {
            Some(Self::Stress)
        } else if contains_any(&lowered, &FATIGUE_CUES) {
            Some(Self::Sleep)
        } else if contains_any(&lowered, &POSITIVE_CUES) {
            Some(Self::Mood)
        } else if contains_any(&lowered, &EXERCISE_CUES) {
            Some(Self::Exercise)
        } else {
            None
        }
    }

    /// Reply lines for this topic
    pub fn replies(&self) -> &'static [&'static str] {
        match self {
            Self::Stress => &STRESS_REPLIES,
            Self::Sleep => &FATIGUE_REPLIES,
            Self::Mood => &POSITIVE_REPLIES,
            Self::Exercise => &EXERCISE_REPLIES,
        }
    }
}

/// Casual persona state: only the last detected topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifestyleCoach {
    pub current_topic: Option<Topic>,
}

impl DialogueScript for LifestyleCoach {
    const PERSONA: Persona = Persona::Lifestyle;

    fn greeting(rng: &mut dyn RngCore) -> &'static str {
        pick(rng, &GREETINGS)
    }

    fn respond(&self, user_text: &str, rng: &mut dyn RngCore) -> (String, Self) {
        match Topic::classify(user_text) {
            Some(topic) => (
                pick(rng, topic.replies()).to_string(),
                Self {
                    current_topic: Some(topic),
                },
            ),
            None => (pick(rng, &FALLBACK_REPLIES).to_string(), self.clone()),
        }
    }

    fn closing(rng: &mut dyn RngCore) -> &'static str {
        pick(rng, &CLOSINGS)
    }
}
