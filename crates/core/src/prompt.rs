use crate::domain::request::IdeaRequest;
use crate::llm::{Message, MessageBag};

/// Fixed instructions: French replies, bare JSON array of `{name, price}`.
pub fn system_prompt() -> String {
    [
        "Tu es un assistant qui génère des idées créatives de cadeaux répondant aux caractéristiques spécifiques des personnes.",
        "Tu réponds toujours en français.",
        "Tes réponses doivent être du JSON valide (uniquement le contenu JSON, pas du markdown) sans explications supplémentaires.",
        "Le format de ta réponse doit être un tableau contenant des objets avec le format suivant :",
        "{",
        "    \"name\": string,",
        "    \"price\": float",
        "}",
        "---",
        "name : \"Nom du cadeau proposé\"",
        "price : \"Prix moyen estimé en euros avec deux décimales\"",
    ]
    .join("\n")
}

pub fn user_prompt(request: &IdeaRequest) -> String {
    format!(
        "Génère une liste de {count} idées de cadeaux pour une personne ayant les caractéristiques suivantes :\n\
- Age : {age}\n\
- Centres d'intérêt : {interests}",
        count = request.count,
        age = request.age,
        interests = request.interests,
    )
}

pub fn message_bag(request: &IdeaRequest) -> MessageBag {
    MessageBag::new(vec![
        Message::for_system(system_prompt()),
        Message::of_user(user_prompt(request)),
    ])
}
