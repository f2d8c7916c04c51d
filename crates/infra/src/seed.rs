//! Deterministic demo data.
//!
//! Everything goes through the services, so seeded documents satisfy the same
//! invariants as ones created over HTTP. User ids are fixed so that tokens for
//! the demo accounts can be minted ahead of time.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use eduhub_auth::{Principal, Role};
use eduhub_catalog::{Category, Level, NewCourse, NewLesson, Rating};
use eduhub_core::{CourseId, DomainError, DomainResult, ExpectedVersion, UserId};
use eduhub_learning::NewUser;

use crate::services::Services;

struct DemoUser {
    name: &'static str,
    email: &'static str,
    bio: &'static str,
    avatar: &'static str,
}

struct DemoCourse {
    title: &'static str,
    description: &'static str,
    short_description: &'static str,
    category: Category,
    level: Level,
    price: f64,
    thumbnail: &'static str,
    tags: &'static [&'static str],
    /// (title, description, minutes)
    lessons: &'static [(&'static str, &'static str, u32)],
    rating: (f64, u32),
}

const INSTRUCTORS: &[DemoUser] = &[
    DemoUser {
        name: "Dr. Sarah Johnson",
        email: "sarah.johnson@eduhub.com",
        bio: "Full-stack developer with 10+ years of experience in web development and teaching.",
        avatar: "https://images.unsplash.com/photo-1494790108755-2616b612b786?w=150&h=150&fit=crop&crop=face",
    },
    DemoUser {
        name: "Prof. Michael Chen",
        email: "michael.chen@eduhub.com",
        bio: "Data science expert and machine learning researcher with PhD in Computer Science.",
        avatar: "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=150&h=150&fit=crop&crop=face",
    },
    DemoUser {
        name: "Emily Rodriguez",
        email: "emily.rodriguez@eduhub.com",
        bio: "UI/UX designer and frontend specialist with expertise in modern design systems.",
        avatar: "https://images.unsplash.com/photo-1438761681033-6461ffad8d80?w=150&h=150&fit=crop&crop=face",
    },
    DemoUser {
        name: "David Kim",
        email: "david.kim@eduhub.com",
        bio: "Business strategy consultant and entrepreneurship expert.",
        avatar: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=150&h=150&fit=crop&crop=face",
    },
];

const STUDENTS: &[DemoUser] = &[
    DemoUser {
        name: "Alex Thompson",
        email: "alex.thompson@email.com",
        bio: "Aspiring web developer passionate about learning new technologies.",
        avatar: "https://images.unsplash.com/photo-1500648767791-00dcc994a43e?w=150&h=150&fit=crop&crop=face",
    },
    DemoUser {
        name: "Jessica Martinez",
        email: "jessica.martinez@email.com",
        bio: "Marketing professional looking to expand skills in digital marketing and analytics.",
        avatar: "https://images.unsplash.com/photo-1544005313-94ddf0286df2?w=150&h=150&fit=crop&crop=face",
    },
    DemoUser {
        name: "Ryan O'Connor",
        email: "ryan.oconnor@email.com",
        bio: "Recent computer science graduate eager to learn advanced programming concepts.",
        avatar: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=150&h=150&fit=crop&crop=face",
    },
];

const COURSES: &[DemoCourse] = &[
    DemoCourse {
        title: "Complete Web Development Bootcamp",
        description: "Master modern web development with HTML, CSS, JavaScript, React, Node.js, and MongoDB. Build real-world projects.",
        short_description: "Learn full-stack web development from scratch with hands-on projects.",
        category: Category::Programming,
        level: Level::Beginner,
        price: 99.99,
        thumbnail: "https://images.unsplash.com/photo-1516321318423-f06f85e504b3?w=400&h=300&fit=crop",
        tags: &["web development", "javascript", "react", "nodejs", "mongodb"],
        lessons: &[
            ("Introduction to Web Development", "Learn the fundamentals and set up your environment.", 45),
            ("HTML Fundamentals", "Master HTML structure and semantic elements.", 60),
            ("CSS Styling and Layout", "Learn CSS styling, flexbox, grid, and responsive design.", 75),
            ("JavaScript Basics", "Variables, functions, and DOM manipulation.", 90),
            ("React Introduction", "Learn React components, state, props, and hooks.", 120),
        ],
        rating: (4.8, 1247),
    },
    DemoCourse {
        title: "Data Science and Machine Learning",
        description: "Comprehensive course covering Python, pandas, NumPy, scikit-learn, TensorFlow, and deep learning.",
        short_description: "Master data science and machine learning with Python.",
        category: Category::DataScience,
        level: Level::Intermediate,
        price: 149.99,
        thumbnail: "https://images.unsplash.com/photo-1551288049-bebda4e38f71?w=400&h=300&fit=crop",
        tags: &["python", "machine learning", "data science", "tensorflow", "pandas"],
        lessons: &[
            ("Python for Data Science", "Python fundamentals for data science applications.", 50),
            ("Data Analysis with Pandas", "Data manipulation and analysis using pandas.", 65),
            ("Machine Learning Fundamentals", "Supervised and unsupervised learning algorithms.", 80),
            ("Deep Learning with TensorFlow", "Build neural networks and deep learning models.", 100),
        ],
        rating: (4.9, 892),
    },
    DemoCourse {
        title: "UI/UX Design Masterclass",
        description: "Learn user interface and user experience design principles, tools, and techniques.",
        short_description: "Master UI/UX design with Figma and design thinking principles.",
        category: Category::Design,
        level: Level::Beginner,
        price: 79.99,
        thumbnail: "https://images.unsplash.com/photo-1558655146-9f40138edfeb?w=400&h=300&fit=crop",
        tags: &["ui design", "ux design", "figma", "adobe xd", "user research"],
        lessons: &[
            ("Design Thinking Process", "Fundamentals of user-centered design.", 40),
            ("Figma Basics", "Master the Figma interface and essential tools.", 55),
            ("Typography and Color Theory", "Effective typography and color combinations.", 45),
            ("Prototyping and User Testing", "Interactive prototypes and user testing sessions.", 70),
        ],
        rating: (4.7, 634),
    },
    DemoCourse {
        title: "Digital Marketing Strategy",
        description: "Digital marketing course covering SEO, social media, email marketing, PPC, and analytics.",
        short_description: "Grow your business and increase online presence.",
        category: Category::Marketing,
        level: Level::Intermediate,
        price: 89.99,
        thumbnail: "https://images.unsplash.com/photo-1460925895917-afdab827c52f?w=400&h=300&fit=crop",
        tags: &["digital marketing", "seo", "social media", "email marketing", "analytics"],
        lessons: &[
            ("Digital Marketing Fundamentals", "The digital marketing landscape and key concepts.", 35),
            ("SEO and Content Marketing", "Search engine optimization and content strategy.", 60),
            ("Social Media Marketing", "Social media platforms and advertising strategies.", 50),
            ("Email Marketing and Automation", "Effective email campaigns and automation.", 45),
        ],
        rating: (4.6, 456),
    },
    DemoCourse {
        title: "Business Strategy and Entrepreneurship",
        description: "Learn how to start, grow, and scale a successful business: models, funding, operations.",
        short_description: "Business strategy and leadership skills for startup success.",
        category: Category::Business,
        level: Level::Advanced,
        price: 199.99,
        thumbnail: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400&h=300&fit=crop",
        tags: &["entrepreneurship", "business strategy", "leadership", "funding", "operations"],
        lessons: &[
            ("Business Model Canvas", "Design and validate your business model.", 40),
            ("Market Research and Analysis", "Market research and competitive analysis.", 55),
            ("Funding and Investment", "Funding options and investor relations.", 65),
            ("Operations and Scaling", "Efficient operations and scaling.", 70),
        ],
        rating: (4.9, 312),
    },
    DemoCourse {
        title: "Advanced React Development",
        description: "Advanced React: hooks, context, performance optimization, testing, and state management.",
        short_description: "Advanced React concepts and modern development practices.",
        category: Category::Programming,
        level: Level::Advanced,
        price: 129.99,
        thumbnail: "https://images.unsplash.com/photo-1633356122544-f134324a6cee?w=400&h=300&fit=crop",
        tags: &["react", "javascript", "hooks", "performance", "testing"],
        lessons: &[
            ("Advanced Hooks and Context", "Custom hooks, context API, and state management.", 60),
            ("Performance Optimization", "React performance optimization techniques.", 75),
            ("Testing with Jest", "Write comprehensive tests for React applications.", 80),
            ("State Management with Redux", "Redux for complex state in React apps.", 90),
        ],
        rating: (4.8, 567),
    },
];

/// Fixed id of the `n`-th demo instructor (0-based).
pub fn demo_instructor_id(n: usize) -> UserId {
    UserId::from_uuid(Uuid::from_u128(0xED00_0000_0000_0000_0000_0000_0000_0100 + n as u128))
}

/// Fixed id of the `n`-th demo student (0-based).
pub fn demo_student_id(n: usize) -> UserId {
    UserId::from_uuid(Uuid::from_u128(0xED00_0000_0000_0000_0000_0000_0000_0200 + n as u128))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub instructors: usize,
    pub students: usize,
    pub courses: usize,
    pub enrollments: usize,
    pub completed_lessons: usize,
}

/// Populate empty stores with demo users, courses, enrollments and progress.
///
/// Does nothing if the first demo instructor already exists.
pub fn seed_demo_data(services: &Services) -> DomainResult<SeedSummary> {
    let mut summary = SeedSummary::default();
    if services.stores().users.get(&demo_instructor_id(0))?.is_some() {
        info!("demo data already present; skipping seed");
        return Ok(summary);
    }

    let instructors = register_all(services, INSTRUCTORS, Role::Instructor, demo_instructor_id)?;
    summary.instructors = instructors.len();
    let students = register_all(services, STUDENTS, Role::Student, demo_student_id)?;
    summary.students = students.len();

    let mut video = 0;
    for (i, demo) in COURSES.iter().enumerate() {
        let instructor = &instructors[i % instructors.len()];
        let view = services.courses.create(
            instructor,
            NewCourse {
                title: demo.title.to_string(),
                description: demo.description.to_string(),
                short_description: demo.short_description.to_string(),
                category: demo.category,
                level: demo.level,
                price: demo.price,
                thumbnail: demo.thumbnail.to_string(),
                tags: demo.tags.iter().map(|t| t.to_string()).collect(),
                is_published: true,
            },
            Some(true),
        )?;
        let course_id = view.id;

        let mut lesson_ids = Vec::with_capacity(demo.lessons.len());
        for (order, (title, description, minutes)) in demo.lessons.iter().enumerate() {
            video += 1;
            let (lesson_id, _) = services.courses.add_lesson(
                instructor,
                course_id,
                NewLesson {
                    title: title.to_string(),
                    description: description.to_string(),
                    video_url: format!("https://example.com/video{video}"),
                    duration_minutes: *minutes,
                    order: order as i32 + 1,
                    is_preview: order == 0,
                },
            )?;
            lesson_ids.push(lesson_id);
        }
        set_rating(services, course_id, demo.rating)?;
        summary.courses += 1;

        // Course i gets the first (i % 3) + 1 students; student j has
        // finished the first (i + j) % lessons of it.
        for (j, student) in students.iter().take(i % students.len() + 1).enumerate() {
            services.enrollments.enroll(student, course_id)?;
            summary.enrollments += 1;
            for lesson_id in lesson_ids.iter().take((i + j) % lesson_ids.len()) {
                services.enrollments.complete_lesson(student, course_id, *lesson_id)?;
                summary.completed_lessons += 1;
            }
        }
    }

    info!(
        instructors = summary.instructors,
        students = summary.students,
        courses = summary.courses,
        enrollments = summary.enrollments,
        "demo data seeded"
    );
    Ok(summary)
}

fn register_all(
    services: &Services,
    users: &[DemoUser],
    role: Role,
    id_for: fn(usize) -> UserId,
) -> DomainResult<Vec<Principal>> {
    let mut out = Vec::with_capacity(users.len());
    for (n, demo) in users.iter().enumerate() {
        let principal = Principal::new(id_for(n), role);
        services.users.register(
            &principal,
            NewUser {
                name: demo.name.to_string(),
                email: demo.email.to_string(),
                bio: demo.bio.to_string(),
                avatar: demo.avatar.to_string(),
            },
        )?;
        info!(user_id = %principal.user_id, %role, email = demo.email, "demo user");
        out.push(principal);
    }
    Ok(out)
}

fn set_rating(services: &Services, course_id: CourseId, (average, count): (f64, u32)) -> DomainResult<()> {
    let rating = Rating::new(average, count)?;
    let courses = &services.stores().courses;
    let mut course = courses
        .get(&course_id)?
        .ok_or(DomainError::NotFound("course"))?;
    course.value.set_rating(rating, Utc::now());
    courses.update(&course_id, course.value, ExpectedVersion::Exact(course.version))?;
    Ok(())
}
